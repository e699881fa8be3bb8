use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};

/// Labelled examples mapping an input vector to its desired output vector.
///
/// All inputs share one length and all desired outputs share another. Inserting an input that
/// is already present replaces its desired output. Iteration follows insertion order.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    inputs_len: usize,
    outputs_len: usize,
    examples: Vec<(Array1<f64>, Array1<f64>)>,
    // Inputs are looked up by the bit patterns of their components.
    positions: HashMap<Vec<u64>, usize>,
}

fn key(input: ArrayView1<f64>) -> Vec<u64> {
    input.iter().map(|v| v.to_bits()).collect()
}

impl Dataset {
    pub fn new(inputs_len: usize, outputs_len: usize) -> Self {
        Self {
            inputs_len,
            outputs_len,
            ..Default::default()
        }
    }

    /// Read a dataset file. See [`Dataset::from_reader`] for the format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Dataset::from_reader(BufReader::new(file))
    }

    /// Replace the contents with the examples in `path`.
    /// On error the dataset is left empty.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.clear();
        *self = Dataset::load(path)?;
        Ok(())
    }

    pub fn parse(text: &str) -> Result<Self> {
        Dataset::from_reader(text.as_bytes())
    }

    /// Parse the whitespace separated text format.
    ///
    /// The first non-blank line is the header `<inputs> <outputs> <examples>`. Each of the next
    /// `<examples>` non-blank lines holds `<inputs> + <outputs>` numbers: the input vector
    /// followed by the desired output vector. Anything after the last example is ignored.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut lines = reader
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(Ok((index + 1, line))),
                Err(e) => Some(Err(Error::from(e))),
            });

        let (header_line, header) = lines.next().transpose()?.ok_or(Error::DataFormat {
            line: 1,
            reason: "missing header".to_string(),
        })?;
        let (inputs_len, outputs_len, count) = parse_header(header_line, &header)?;

        let mut dataset = Dataset::new(inputs_len, outputs_len);
        let mut last_line = header_line;
        for read in 0..count {
            let (number, line) = lines.next().transpose()?.ok_or_else(|| Error::DataFormat {
                line: last_line + 1,
                reason: format!("expected {} examples but found {}", count, read),
            })?;
            last_line = number;

            let mut values = parse_values(number, &line)?;
            if values.len() != inputs_len + outputs_len {
                return Err(Error::DataFormat {
                    line: number,
                    reason: format!(
                        "expected {} fields but found {}",
                        inputs_len + outputs_len,
                        values.len()
                    ),
                });
            }
            let desired = values.split_off(inputs_len);
            dataset.insert(Array1::from(values), Array1::from(desired))?;
        }
        Ok(dataset)
    }

    /// Add an example, returning the desired output it replaced if the input was already known.
    pub fn insert(
        &mut self,
        input: Array1<f64>,
        desired: Array1<f64>,
    ) -> Result<Option<Array1<f64>>> {
        if input.len() != self.inputs_len {
            return Err(Error::ShapeMismatch {
                what: "example input",
                expected: self.inputs_len,
                actual: input.len(),
            });
        }
        if desired.len() != self.outputs_len {
            return Err(Error::ShapeMismatch {
                what: "example desired output",
                expected: self.outputs_len,
                actual: desired.len(),
            });
        }

        let key = key(input.view());
        match self.positions.get(&key) {
            Some(&position) => Ok(Some(std::mem::replace(
                &mut self.examples[position].1,
                desired,
            ))),
            None => {
                self.positions.insert(key, self.examples.len());
                self.examples.push((input, desired));
                Ok(None)
            }
        }
    }

    /// Desired output of `input`, if it is part of the dataset.
    pub fn get(&self, input: ArrayView1<f64>) -> Option<ArrayView1<f64>> {
        self.positions
            .get(&key(input))
            .map(|&position| self.examples[position].1.view())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArrayView1<f64>, ArrayView1<f64>)> + '_ {
        self.examples
            .iter()
            .map(|(input, desired)| (input.view(), desired.view()))
    }

    pub fn inputs_len(&self) -> usize {
        self.inputs_len
    }

    pub fn outputs_len(&self) -> usize {
        self.outputs_len
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Dataset::default();
    }
}

fn parse_header(line: usize, header: &str) -> Result<(usize, usize, usize)> {
    let fields = header
        .split_whitespace()
        .map(|field| field.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::DataFormat {
            line,
            reason: format!("header is not valid: {}", e),
        })?;
    match fields[..] {
        [inputs, outputs, count, ..] => Ok((inputs, outputs, count)),
        _ => Err(Error::DataFormat {
            line,
            reason: format!("header needs 3 fields but has {}", fields.len()),
        }),
    }
}

fn parse_values(line: usize, text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|field| {
            field.parse::<f64>().map_err(|e| Error::DataFormat {
                line,
                reason: format!("{:?} is not a number: {}", field, e),
            })
        })
        .collect()
}
