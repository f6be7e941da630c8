use chatrelay_core::{RelayError, RelayResult, TokenEstimator};
use tiktoken_rs::{CoreBPE, get_bpe_from_model, o200k_base};

/// Counts tokens with a tiktoken BPE; unknown models use `o200k_base`.
pub struct TiktokenEstimator {
    bpe: CoreBPE,
}

impl TiktokenEstimator {
    pub fn new() -> RelayResult<Self> {
        let bpe = o200k_base().map_err(|err| RelayError::Adapter(err.to_string()))?;
        Ok(Self { bpe })
    }

    pub fn for_model(model: &str) -> RelayResult<Self> {
        let bpe = get_bpe_from_model(model)
            .or_else(|_| o200k_base())
            .map_err(|err| RelayError::Adapter(err.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn count(&self, text: &str) -> i64 {
        self.bpe.encode_ordinary(text).len() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ordinary_text() {
        let estimator = TiktokenEstimator::new().unwrap();
        assert_eq!(estimator.count(""), 0);
        let short = estimator.count("hello");
        assert!(short >= 1);
        assert!(estimator.count("hello hello hello hello") > short);
    }

    #[test]
    fn unknown_model_falls_back() {
        let estimator = TiktokenEstimator::for_model("lmsys-private-model").unwrap();
        assert!(estimator.count("fallback encoding") > 0);
    }
}
