use crate::domain::transaction::GatewayReference;
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

const TOKEN_LEN: usize = 16;

/// Generates a gateway reference of the form `TX-<millis>-<token>`.
///
/// The millisecond prefix keeps references roughly ordered; the 16 random
/// alphanumeric characters (~95 bits) make collisions negligible even for
/// attempts created in the same millisecond.
pub fn generate() -> GatewayReference {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    GatewayReference::new(format!("TX-{}-{}", Utc::now().timestamp_millis(), token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_format() {
        let reference = generate();
        let parts: Vec<&str> = reference.as_str().splitn(3, '-').collect();
        assert_eq!(parts[0], "TX");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), TOKEN_LEN);
    }

    #[test]
    fn test_references_are_unique() {
        let refs: HashSet<_> = (0..10_000).map(|_| generate()).collect();
        assert_eq!(refs.len(), 10_000);
    }
}
