use serbus_link::SerialLink;

use crate::checksum::Checksum;
use crate::error::{FrameError, Result};
use crate::wire::{FrameInfo, Status, ESCAPE, FRAME_START, MAX_PAYLOAD};

/// Encode one frame onto the link.
///
/// Emits the raw start byte, then the info byte, length byte and payload —
/// each escaped on the wire and fed to the checksum — and finally the
/// 16-bit checksum, high byte first, escaped but excluded from its own
/// computation. Blocks on link backpressure; on error the frame may be
/// partially written (the receiver discards it as incomplete).
pub fn write_frame<L, C>(link: &mut L, crc: &mut C, info: FrameInfo, payload: &[u8]) -> Result<()>
where
    L: SerialLink + ?Sized,
    C: Checksum + ?Sized,
{
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    crc.reset();
    link.write_byte(FRAME_START)?;
    put_summed(link, crc, info.to_byte())?;
    put_summed(link, crc, payload.len() as u8)?;
    for &byte in payload {
        put_summed(link, crc, byte)?;
    }

    let sum = crc.finalize();
    put(link, (sum >> 8) as u8)?;
    put(link, (sum & 0xFF) as u8)?;
    Ok(())
}

/// Encode an acknowledgment frame carrying one status byte.
pub fn write_ack_frame<L, C>(link: &mut L, crc: &mut C, status: Status) -> Result<()>
where
    L: SerialLink + ?Sized,
    C: Checksum + ?Sized,
{
    write_frame(link, crc, FrameInfo::ack(), &[status.to_wire()])
}

fn put_summed<L, C>(link: &mut L, crc: &mut C, byte: u8) -> Result<()>
where
    L: SerialLink + ?Sized,
    C: Checksum + ?Sized,
{
    put(link, byte)?;
    crc.update(byte);
    Ok(())
}

fn put<L>(link: &mut L, byte: u8) -> Result<()>
where
    L: SerialLink + ?Sized,
{
    if byte == FRAME_START || byte == ESCAPE {
        link.write_byte(ESCAPE)?;
    }
    link.write_byte(byte)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Crc16;
    use crate::wire::ACK_TOPIC;

    #[derive(Default)]
    struct VecLink {
        wire: Vec<u8>,
    }

    impl SerialLink for VecLink {
        fn bytes_available(&mut self) -> serbus_link::Result<usize> {
            Ok(0)
        }

        fn read_byte(&mut self) -> serbus_link::Result<u8> {
            Err(serbus_link::LinkError::Closed)
        }

        fn write_byte(&mut self, byte: u8) -> serbus_link::Result<()> {
            self.wire.push(byte);
            Ok(())
        }
    }

    fn ccitt(bytes: &[u8]) -> u16 {
        let mut crc = Crc16::new();
        for &byte in bytes {
            crc.update(byte);
        }
        crc.finalize()
    }

    #[test]
    fn plain_frame_layout() {
        let mut link = VecLink::default();
        let mut crc = Crc16::new();

        write_frame(
            &mut link,
            &mut crc,
            FrameInfo::data(5, false),
            &[0x01, 0x02, 0x03],
        )
        .unwrap();

        let sum = ccitt(&[0x05, 0x03, 0x01, 0x02, 0x03]);
        assert_eq!(
            link.wire,
            vec![
                FRAME_START,
                0x05,
                0x03,
                0x01,
                0x02,
                0x03,
                (sum >> 8) as u8,
                (sum & 0xFF) as u8,
            ]
        );
    }

    #[test]
    fn reserved_bytes_are_escaped() {
        let mut link = VecLink::default();
        let mut crc = Crc16::new();

        write_frame(
            &mut link,
            &mut crc,
            FrameInfo::data(1, false),
            &[FRAME_START, ESCAPE],
        )
        .unwrap();

        // START is raw; the two payload bytes each gain an escape prefix.
        assert_eq!(link.wire[0], FRAME_START);
        assert_eq!(&link.wire[3..7], &[ESCAPE, FRAME_START, ESCAPE, ESCAPE]);
    }

    #[test]
    fn checksum_covers_logical_bytes_only() {
        // The escaped wire image must carry the CRC of the *unescaped*
        // info/length/payload bytes.
        let payload = [FRAME_START, 0x42, ESCAPE];
        let mut link = VecLink::default();
        let mut crc = Crc16::new();
        write_frame(&mut link, &mut crc, FrameInfo::data(9, false), &payload).unwrap();

        let mut logical = vec![0x09, payload.len() as u8];
        logical.extend_from_slice(&payload);
        let sum = ccitt(&logical);

        let n = link.wire.len();
        // Neither CRC byte collides with a marker for this input, so the
        // last two wire bytes are the CRC itself.
        assert_eq!(link.wire[n - 2], (sum >> 8) as u8);
        assert_eq!(link.wire[n - 1], (sum & 0xFF) as u8);
    }

    #[test]
    fn empty_payload_frame() {
        let mut link = VecLink::default();
        let mut crc = Crc16::new();

        write_frame(&mut link, &mut crc, FrameInfo::data(0, false), &[]).unwrap();

        let sum = ccitt(&[0x00, 0x00]);
        assert_eq!(
            link.wire,
            vec![FRAME_START, 0x00, 0x00, (sum >> 8) as u8, (sum & 0xFF) as u8]
        );
    }

    #[test]
    fn oversized_payload_rejected() {
        let mut link = VecLink::default();
        let mut crc = Crc16::new();

        let err = write_frame(
            &mut link,
            &mut crc,
            FrameInfo::data(0, false),
            &[0u8; MAX_PAYLOAD + 1],
        )
        .unwrap_err();

        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(link.wire.is_empty(), "nothing written for rejected frame");
    }

    #[test]
    fn ack_frame_layout() {
        let mut link = VecLink::default();
        let mut crc = Crc16::new();

        write_ack_frame(&mut link, &mut crc, Status::Rejected).unwrap();

        // The ack info byte is 0x7F (topic 63 + ack bit), which collides
        // with the escape marker, so it always travels escaped.
        assert_eq!(link.wire[0], FRAME_START);
        assert_eq!(link.wire[1], ESCAPE);
        let info = FrameInfo::from_byte(link.wire[2]);
        assert!(info.is_ack);
        assert_eq!(info.topic, ACK_TOPIC);
        assert!(!info.ack_requested);
        assert_eq!(link.wire[3], 1, "ack frames carry one status byte");
        assert_eq!(link.wire[4], Status::Rejected.to_wire());
    }
}
