//! Framing codec translating between byte streams and [`Envelope`]s.
//!
//! Error containment rules:
//! - bad magic or an oversized length field poisons the stream and
//!   tears the connection down (resync is impossible past that point)
//! - a checksum mismatch or unknown kind discards that envelope only;
//!   the stream stays usable

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::envelope::{Envelope, EnvelopeHeader, MAX_PAYLOAD_SIZE};
use crate::error::Error;

pub struct EnvelopeCodec;

impl Decoder for EnvelopeCodec {
    type Item = Envelope;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Envelope>, Error> {
        loop {
            if src.len() < EnvelopeHeader::SIZE {
                return Ok(None);
            }

            let header = EnvelopeHeader::decode(&src[..EnvelopeHeader::SIZE])?;
            let payload_len = header.payload_len as usize;
            if payload_len > MAX_PAYLOAD_SIZE {
                // Reject before buffering the body.
                return Err(Error::PayloadTooLarge {
                    size: payload_len,
                    max: MAX_PAYLOAD_SIZE,
                });
            }

            let total = EnvelopeHeader::SIZE + payload_len;
            if src.len() < total {
                return Ok(None);
            }

            let raw = src.split_to(total);
            match Envelope::from_parts(header, &raw[EnvelopeHeader::SIZE..]) {
                Ok(envelope) => return Ok(Some(envelope)),
                Err(e) => {
                    warn!("envelope discarded: {e}");
                    continue;
                }
            }
        }
    }
}

impl Encoder<Envelope> for EnvelopeCodec {
    type Error = Error;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<(), Error> {
        let header = item.header();
        dst.reserve(EnvelopeHeader::SIZE + item.payload().len());
        dst.extend_from_slice(&header.encode());
        dst.extend_from_slice(item.payload());
        Ok(())
    }
}
