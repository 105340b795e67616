//! Unit tests for `CanFrame` construction and accessors.
use super::*;
use embedded_can::Frame;

#[test]
/// Payloads longer than 8 bytes are rejected.
fn test_new_rejects_oversized_payload() {
    let id = StandardId::new(0x123).unwrap();
    assert!(CanFrame::new(id, &[0u8; 9]).is_none());
    assert!(CanFrame::new_remote(id, 9).is_none());

    let frame = CanFrame::new(id, &[1, 2, 3]).unwrap();
    assert_eq!(frame.dlc(), 3);
    assert_eq!(frame.data(), &[1, 2, 3]);
    assert!(!frame.is_extended());
}

#[test]
/// Remote frames keep the requested length but expose no data.
fn test_remote_frame_has_no_payload() {
    let mut frame = CanFrame::new_remote(StandardId::new(0x7FF).unwrap(), 4).unwrap();
    assert!(frame.is_remote_frame());
    assert_eq!(frame.dlc(), 4);
    assert!(frame.payload().is_empty());
    assert!(frame.payload_mut().is_empty());
}

#[test]
/// Raw identifiers map to the narrowest identifier form.
fn test_from_raw_id() {
    let standard = CanFrame::from_raw_id(0x123, false, &[0xAA]).unwrap();
    assert!(!standard.is_extended());
    assert_eq!(standard.raw_id(), 0x123);

    let extended = CanFrame::from_raw_id(0x18FF_1234, false, &[]).unwrap();
    assert!(extended.is_extended());
    assert_eq!(extended.raw_id(), 0x18FF_1234);

    // More than 29 bits cannot be represented.
    assert!(CanFrame::from_raw_id(0x2000_0000, false, &[]).is_none());
}

#[test]
/// A length written past the buffer is clamped instead of panicking.
fn test_out_of_range_len_is_clamped() {
    let mut frame = CanFrame::from_raw_id(0x10, false, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    frame.len = 9;
    assert!(!frame.has_valid_len());
    assert_eq!(frame.payload().len(), MAX_PAYLOAD_LEN);
    assert_eq!(frame.payload_mut().len(), MAX_PAYLOAD_LEN);
}
