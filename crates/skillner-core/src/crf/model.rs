//! Linear-chain CRF over sparse token features.
//!
//! [`CrfNetwork`] holds trainable candle variables and computes the
//! negative log-likelihood of a gold tag path. [`CrfParams`] is the frozen,
//! plain-array snapshot used for inference and persistence.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{Init, VarBuilder, VarMap};
use safetensors::{Dtype, SafeTensors};

use crate::error::{Result, SkillnerError};
use crate::tagger::bio_tags::BioTag;
use crate::tagger::features::FEATURES_PER_TOKEN;
use crate::tagger::viterbi::{TagScores, TransitionMatrix};

const NUM_TAGS: usize = BioTag::NUM_TAGS;

/// Tensor names inside `model.safetensors`.
pub const EMISSION: &str = "emission";
pub const TRANSITIONS: &str = "transitions";
pub const START: &str = "start";
pub const END: &str = "end";

/// Score added to forbidden BIO starts and transitions in the partition
/// function; large enough that `exp` underflows to zero in f32.
const FORBIDDEN: f32 = -1.0e4;

/// Trainable CRF: emission table `[rows, tags]`, transitions `[tags, tags]`,
/// start and end vectors `[tags]`. Every parameter starts at zero.
///
/// The partition function only sums over paths the Viterbi decoder can
/// produce: an `I-` tag never opens a sequence or follows `O`.
pub struct CrfNetwork {
    varmap: VarMap,
    emission: Tensor,
    transitions: Tensor,
    start: Tensor,
    end: Tensor,
    start_mask: Tensor,
    transition_mask: Tensor,
    device: Device,
}

impl CrfNetwork {
    /// Create a blank network with `num_rows` emission rows.
    pub fn new(num_rows: usize) -> Result<Self> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let zeros = Init::Const(0.0);

        let emission = vb.get_with_hints((num_rows, NUM_TAGS), EMISSION, zeros)?;
        let transitions = vb.get_with_hints((NUM_TAGS, NUM_TAGS), TRANSITIONS, zeros)?;
        let start = vb.get_with_hints(NUM_TAGS, START, zeros)?;
        let end = vb.get_with_hints(NUM_TAGS, END, zeros)?;

        let tags = BioTag::all_tags();
        let start_mask: Vec<f32> = tags
            .iter()
            .map(|&tag| if BioTag::is_valid_start(tag) { 0.0 } else { FORBIDDEN })
            .collect();
        let transition_mask: Vec<f32> = tags
            .iter()
            .flat_map(|&from| {
                tags.iter().map(move |&to| {
                    if BioTag::is_valid_transition(from, to) {
                        0.0
                    } else {
                        FORBIDDEN
                    }
                })
            })
            .collect();

        Ok(Self {
            varmap,
            emission,
            transitions,
            start,
            end,
            start_mask: Tensor::from_vec(start_mask, NUM_TAGS, &device)?,
            transition_mask: Tensor::from_vec(transition_mask, (NUM_TAGS, NUM_TAGS), &device)?,
            device,
        })
    }

    /// All trainable variables, for the optimizer.
    pub fn vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Per-token emission scores `[len, tags]`.
    ///
    /// `rows` holds `FEATURES_PER_TOKEN` feature rows per token; `mask`, when
    /// given, scales each feature's row (feature dropout).
    fn emissions(&self, rows: &[u32], mask: Option<&[f32]>) -> Result<Tensor> {
        let len = rows.len() / FEATURES_PER_TOKEN;
        let ids = Tensor::from_slice(rows, rows.len(), &self.device)?;
        let table = self
            .emission
            .index_select(&ids, 0)?
            .reshape((len, FEATURES_PER_TOKEN, NUM_TAGS))?;

        let table = match mask {
            Some(mask) => {
                let mask = Tensor::from_slice(mask, (len, FEATURES_PER_TOKEN, 1), &self.device)?;
                table.broadcast_mul(&mask)?
            }
            None => table,
        };

        Ok(table.sum(1)?)
    }

    /// Negative log-likelihood of `tags` for one token sequence.
    ///
    /// `tags` must be non-empty and `rows.len()` must equal
    /// `tags.len() * FEATURES_PER_TOKEN`.
    pub fn nll(&self, rows: &[u32], tags: &[BioTag], mask: Option<&[f32]>) -> Result<Tensor> {
        let len = tags.len();
        let emissions = self.emissions(rows, mask)?;

        // Forward algorithm: log-sum over every legal path
        let start = self.start.add(&self.start_mask)?;
        let transitions = self.transitions.add(&self.transition_mask)?;
        let mut alpha = start.add(&emissions.get(0)?)?;
        for pos in 1..len {
            let scores = alpha.unsqueeze(1)?.broadcast_add(&transitions)?;
            alpha = log_sum_exp(&scores, 0)?.add(&emissions.get(pos)?)?;
        }
        let log_z = log_sum_exp(&alpha.add(&self.end)?, 0)?;

        // Score of the gold path, with the same masks applied
        let tag_ids: Vec<u32> = tags.iter().map(|t| t.index() as u32).collect();
        let gold_ids = Tensor::from_slice(&tag_ids, (len, 1), &self.device)?;
        let mut gold = emissions.gather(&gold_ids, 1)?.sum_all()?;
        gold = gold
            .add(&start.get(tags[0].index())?)?
            .add(&self.end.get(tags[len - 1].index())?)?;

        if len > 1 {
            let pairs: Vec<u32> = tags
                .windows(2)
                .map(|w| (w[0].index() * NUM_TAGS + w[1].index()) as u32)
                .collect();
            let pairs = Tensor::from_slice(&pairs, len - 1, &self.device)?;
            let transition_score = transitions
                .flatten_all()?
                .index_select(&pairs, 0)?
                .sum_all()?;
            gold = gold.add(&transition_score)?;
        }

        Ok(log_z.sub(&gold)?)
    }

    /// Copy the current parameter values out of the variable store.
    pub fn snapshot(&self) -> Result<CrfParams> {
        let emission = self
            .emission
            .to_vec2::<f32>()?
            .iter()
            .map(|row| to_scores(row))
            .collect::<Result<Vec<_>>>()?;

        let mut transitions = [[0.0; NUM_TAGS]; NUM_TAGS];
        for (dst, row) in transitions.iter_mut().zip(self.transitions.to_vec2::<f32>()?) {
            *dst = to_scores(&row)?;
        }

        Ok(CrfParams {
            emission,
            transitions,
            start: to_scores(&self.start.to_vec1::<f32>()?)?,
            end: to_scores(&self.end.to_vec1::<f32>()?)?,
        })
    }
}

/// Numerically stable `log(sum(exp(xs)))` along `dim`, which is removed.
fn log_sum_exp(xs: &Tensor, dim: usize) -> candle_core::Result<Tensor> {
    let max = xs.max_keepdim(dim)?;
    xs.broadcast_sub(&max)?
        .exp()?
        .sum_keepdim(dim)?
        .log()?
        .add(&max)?
        .squeeze(dim)
}

fn to_scores(values: &[f32]) -> Result<TagScores> {
    TagScores::try_from(values).map_err(|_| {
        SkillnerError::ModelLoad(format!(
            "expected {NUM_TAGS} tag scores, got {}",
            values.len()
        ))
    })
}

/// Frozen CRF parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CrfParams {
    pub emission: Vec<TagScores>,
    pub transitions: TransitionMatrix,
    pub start: TagScores,
    pub end: TagScores,
}

impl CrfParams {
    /// All-zero parameters with `num_rows` emission rows.
    pub fn zeros(num_rows: usize) -> Self {
        Self {
            emission: vec![[0.0; NUM_TAGS]; num_rows],
            transitions: [[0.0; NUM_TAGS]; NUM_TAGS],
            start: [0.0; NUM_TAGS],
            end: [0.0; NUM_TAGS],
        }
    }

    /// Sum the emission rows of each token's features.
    ///
    /// Rows past the end of the table score as the unknown row (all zero).
    pub fn emissions(&self, rows: &[u32]) -> Vec<TagScores> {
        rows.chunks(FEATURES_PER_TOKEN)
            .map(|token_rows| {
                let mut scores = [0.0; NUM_TAGS];
                for &row in token_rows {
                    if let Some(weights) = self.emission.get(row as usize) {
                        for (score, weight) in scores.iter_mut().zip(weights) {
                            *score += weight;
                        }
                    }
                }
                scores
            })
            .collect()
    }

    /// Write the parameters as a safetensors file.
    pub fn save_safetensors(&self, path: &Path) -> Result<()> {
        let device = Device::Cpu;
        let flat: Vec<f32> = self.emission.iter().flatten().copied().collect();
        let transitions: Vec<f32> = self.transitions.iter().flatten().copied().collect();

        let tensors = HashMap::from([
            (
                EMISSION,
                Tensor::from_vec(flat, (self.emission.len(), NUM_TAGS), &device)?,
            ),
            (
                TRANSITIONS,
                Tensor::from_vec(transitions, (NUM_TAGS, NUM_TAGS), &device)?,
            ),
            (START, Tensor::from_slice(&self.start[..], NUM_TAGS, &device)?),
            (END, Tensor::from_slice(&self.end[..], NUM_TAGS, &device)?),
        ]);

        candle_core::safetensors::save(&tensors, path)?;
        Ok(())
    }

    /// Read parameters back from safetensors bytes, checking every tensor's
    /// name, dtype and shape against the expected emission row count.
    pub fn from_safetensors(bytes: &[u8], num_rows: usize) -> Result<Self> {
        let tensors =
            SafeTensors::deserialize(bytes).map_err(|e| SkillnerError::ModelLoad(e.to_string()))?;

        let read = |name: &str, shape: &[usize]| -> Result<Vec<f32>> {
            let view = tensors
                .tensor(name)
                .map_err(|e| SkillnerError::ModelLoad(format!("{name}: {e}")))?;
            if view.dtype() != Dtype::F32 || view.shape() != shape {
                return Err(SkillnerError::ModelLoad(format!(
                    "{name}: expected F32 {shape:?}, found {:?} {:?}",
                    view.dtype(),
                    view.shape()
                )));
            }
            Ok(view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect())
        };

        let emission = read(EMISSION, &[num_rows, NUM_TAGS])?
            .chunks_exact(NUM_TAGS)
            .map(to_scores)
            .collect::<Result<Vec<_>>>()?;

        let mut transitions = [[0.0; NUM_TAGS]; NUM_TAGS];
        for (dst, row) in transitions
            .iter_mut()
            .zip(read(TRANSITIONS, &[NUM_TAGS, NUM_TAGS])?.chunks_exact(NUM_TAGS))
        {
            *dst = to_scores(row)?;
        }

        Ok(Self {
            emission,
            transitions,
            start: to_scores(&read(START, &[NUM_TAGS])?)?,
            end: to_scores(&read(END, &[NUM_TAGS])?)?,
        })
    }
}
