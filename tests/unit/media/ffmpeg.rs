use super::*;

#[test]
fn f32le_bytes_round_into_samples() {
    let mut bytes = Vec::new();
    for v in [0.5f32, -1.0, 0.25] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(f32le_to_samples(&bytes).unwrap(), vec![0.5, -1.0, 0.25]);
}

#[test]
fn misaligned_pcm_is_a_decode_error() {
    let err = f32le_to_samples(&[0, 0, 0]).unwrap_err();
    assert!(err.to_string().starts_with("decode error:"));
}
