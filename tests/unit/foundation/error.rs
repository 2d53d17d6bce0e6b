use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MemeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MemeError::measurement("x")
            .to_string()
            .contains("measurement unavailable:")
    );
    assert!(
        MemeError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert!(
        MemeError::topic_source("x")
            .to_string()
            .contains("topic source unavailable:")
    );
    assert!(
        MemeError::exhausted("x")
            .to_string()
            .contains("all topics exhausted:")
    );
    assert!(MemeError::storage("x").to_string().contains("storage error:"));
    assert!(
        MemeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MemeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
