use crate::domain::transaction::GatewayVerdict;
use crate::error::{OrderError, Result};
use std::io::Read;

/// Reads recorded gateway verdicts from a CSV source with the header
/// `reference, verdict`.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<GatewayVerdict>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct VerdictReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> VerdictReader<R> {
    /// Creates a new `VerdictReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes verdicts.
    pub fn verdicts(self) -> impl Iterator<Item = Result<GatewayVerdict>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(OrderError::from))
    }
}
