//! # Viterbi Decoding for CRF
//!
//! Implements the Viterbi algorithm for finding the most likely tag sequence
//! given emission scores, transition scores and BIO constraints.

use crate::tagger::bio_tags::BioTag;

const NUM_TAGS: usize = BioTag::NUM_TAGS;

/// Score rows indexed by tag.
pub type TagScores = [f32; NUM_TAGS];

/// Transition scores, `[from][to]`.
pub type TransitionMatrix = [[f32; NUM_TAGS]; NUM_TAGS];

/// Viterbi decoder for CRF tag sequences.
///
/// Forbidden BIO transitions (and sequences opening with an Inside tag) are
/// excluded from the search rather than merely penalized.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    valid_transitions: [[bool; NUM_TAGS]; NUM_TAGS],
    valid_starts: [bool; NUM_TAGS],
}

impl ViterbiDecoder {
    /// Create a decoder with the BIO constraint mask pre-computed.
    pub fn new() -> Self {
        let mut valid_transitions = [[false; NUM_TAGS]; NUM_TAGS];
        let mut valid_starts = [false; NUM_TAGS];

        for &prev in BioTag::all_tags() {
            valid_starts[prev.index()] = BioTag::is_valid_start(prev);
            for &curr in BioTag::all_tags() {
                valid_transitions[prev.index()][curr.index()] =
                    BioTag::is_valid_transition(prev, curr);
            }
        }

        Self {
            valid_transitions,
            valid_starts,
        }
    }

    /// Decode the optimal tag sequence.
    ///
    /// # Arguments
    /// * `emissions` - one score row per token
    /// * `transitions` - `[from][to]` transition scores
    /// * `start` / `end` - scores for opening and closing the sequence with a tag
    ///
    /// # Returns
    /// The optimal tag sequence as indices, one per token.
    pub fn decode(
        &self,
        emissions: &[TagScores],
        transitions: &TransitionMatrix,
        start: &TagScores,
        end: &TagScores,
    ) -> Vec<usize> {
        let seq_len = emissions.len();
        if seq_len == 0 {
            return Vec::new();
        }

        let mut dp = vec![[f32::NEG_INFINITY; NUM_TAGS]; seq_len];
        let mut backptr = vec![[0usize; NUM_TAGS]; seq_len];

        for tag in 0..NUM_TAGS {
            if self.valid_starts[tag] {
                dp[0][tag] = start[tag] + emissions[0][tag];
            }
        }

        for pos in 1..seq_len {
            for curr_tag in 0..NUM_TAGS {
                let mut best_score = f32::NEG_INFINITY;
                let mut best_prev = 0;

                for prev_tag in 0..NUM_TAGS {
                    if !self.valid_transitions[prev_tag][curr_tag] {
                        continue;
                    }

                    let score = dp[pos - 1][prev_tag] + transitions[prev_tag][curr_tag];
                    if score > best_score {
                        best_score = score;
                        best_prev = prev_tag;
                    }
                }

                dp[pos][curr_tag] = best_score + emissions[pos][curr_tag];
                backptr[pos][curr_tag] = best_prev;
            }
        }

        // Outside is always reachable, so it is a safe default for the final tag
        let mut best_final_tag = BioTag::Outside.index();
        let mut best_final_score = f32::NEG_INFINITY;
        for tag in 0..NUM_TAGS {
            let score = dp[seq_len - 1][tag] + end[tag];
            if score > best_final_score {
                best_final_score = score;
                best_final_tag = tag;
            }
        }

        let mut path = vec![best_final_tag];
        let mut curr_tag = best_final_tag;
        for pos in (1..seq_len).rev() {
            curr_tag = backptr[pos][curr_tag];
            path.push(curr_tag);
        }

        path.reverse();
        path
    }
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new()
    }
}
