//! Shortest mixed-scheme encoding
//!
//! Keeps one best channel per scheme. Each step extends every live channel by one input byte
//! into every scheme and keeps, per target scheme, the shortest result. Channels that reach the
//! end of the input are set aside; the shortest of those wins.

use super::Scheme;
use super::channel::Channel;
use crate::error::{DmtxError, Result};
use crate::models::SizeRequest;

/// Best extension of any channel in `group` into `target`, `None` when no channel can take
/// the next byte in that scheme
fn find_best_channel<'a>(
    group: &[Option<Channel<'a>>],
    target: Scheme,
) -> Result<Option<Channel<'a>>> {
    let mut winner: Option<Channel<'a>> = None;

    for from in group.iter().flatten() {
        if from.is_complete() || !from.is_valid() {
            continue;
        }

        let mut channel = from.clone();
        match channel.encode_next_word(target) {
            Ok(()) => {}
            Err(e @ DmtxError::Internal(_)) => return Err(e),
            Err(_) => continue,
        }
        // Triplet channels look ahead, so a rejection only rules out this origin
        if !channel.is_valid() {
            continue;
        }

        if winner
            .as_ref()
            .is_none_or(|best| channel.current_length < best.current_length)
        {
            winner = Some(channel);
        }
    }

    Ok(winner)
}

/// Keep the shorter of `finished` and every complete channel in `group`
fn collect_finished<'a>(finished: &mut Option<Channel<'a>>, group: &[Option<Channel<'a>>]) {
    for channel in group.iter().flatten() {
        if !channel.is_complete() || !channel.is_valid() {
            continue;
        }
        if finished
            .as_ref()
            .is_none_or(|best| channel.encoded_length < best.encoded_length)
        {
            *finished = Some(channel.clone());
        }
    }
}

pub(crate) fn encode_auto_best(input: &[u8], size_request: SizeRequest) -> Result<Vec<u8>> {
    let mut optimal: Vec<Option<Channel>> = Vec::with_capacity(Scheme::CONCRETE.len());
    for target in Scheme::CONCRETE {
        let mut channel = Channel::new(input, size_request);
        let live = match channel.encode_next_word(target) {
            Ok(()) => channel.is_valid(),
            Err(e @ DmtxError::Internal(_)) => return Err(e),
            Err(_) => false,
        };
        optimal.push(live.then_some(channel));
    }

    let mut finished: Option<Channel> = None;
    loop {
        collect_finished(&mut finished, &optimal);
        let live = optimal
            .iter()
            .flatten()
            .any(|channel| !channel.is_complete());
        if !live {
            break;
        }

        let mut best = Vec::with_capacity(Scheme::CONCRETE.len());
        for target in Scheme::CONCRETE {
            best.push(find_best_channel(&optimal, target)?);
        }
        optimal = best;
    }

    let winner = finished.ok_or(DmtxError::CapacityExceeded { words: input.len() })?;
    tracing::trace!(
        scheme = %winner.scheme(),
        words = winner.codewords().len(),
        "auto compaction chose channel"
    );
    Ok(winner.codewords().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_stay_ascii() {
        let words = encode_auto_best(b"12345678", SizeRequest::SquareAuto).unwrap();
        assert_eq!(words, vec![142, 164, 186, 208]);
    }

    #[test]
    fn test_upper_case_run_prefers_c40() {
        let words = encode_auto_best(b"ABCDEFGHIJKLMNOPQRSTUVWX", SizeRequest::SquareAuto).unwrap();
        assert_eq!(words[0], 230);
        assert!(words.len() < 24);
    }

    #[test]
    fn test_binary_is_encodable() {
        let data: Vec<u8> = (0..=255u8).collect();
        let words = encode_auto_best(&data, SizeRequest::ShapeAuto).unwrap();
        assert!(words.len() <= 1 + 2 + 256);
    }
}
