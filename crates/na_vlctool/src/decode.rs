use log::{debug, warn};
use na_bitstream::{BitReader, BitstreamError, Vlc};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub symbols: Vec<i32>,
    pub bits_used: usize,
    /// Why decoding stopped before the end of the data, if it did.
    pub error: Option<BitstreamError>,
}

/// Decode symbols from `data` until its bits are used up, `limit` symbols
/// were produced, or the stream turns out to be corrupt.
pub fn decode_all(vlc: &Vlc, data: &[u8], limit: Option<usize>) -> DecodeOutcome {
    let mut br = BitReader::with_order(data, vlc.order());
    let mut outcome = DecodeOutcome::default();
    let limit = limit.unwrap_or(usize::MAX);

    while !br.is_exhausted() && outcome.symbols.len() < limit {
        match vlc.decode(&mut br) {
            Ok(symbol) => {
                if let Err(e) = br.check_overread() {
                    outcome.error = Some(e);
                    break;
                }
                outcome.symbols.push(symbol);
                outcome.bits_used = br.position();
            }
            Err(e) => {
                warn!("stopping after {} symbols: {}", outcome.symbols.len(), e);
                outcome.error = Some(e);
                break;
            }
        }
    }
    debug!(
        "decoded {} symbols from {} of {} bits",
        outcome.symbols.len(),
        outcome.bits_used,
        br.bit_length()
    );
    outcome
}
