//! Round sizing and token distribution.
//!
//! A round hands out the global turn values `0..total_turns` to the active
//! participants. The values are shuffled once, cut into equal contiguous
//! blocks in roster order, and every block is sorted so that each participant
//! consumes its own tokens smallest-first.

use crate::error::GameError;
use crate::shuffle::shuffle_with;
use crate::ParticipantId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Token distribution for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPlan {
    pub round_number: u32,
    pub tokens_per_participant: u32,
    pub total_turns: u32,
    /// Sorted private tokens, in the order participants were given.
    pub assignments: Vec<(ParticipantId, Vec<u32>)>,
}

/// Token → owner table used to find who holds a turn value.
pub fn owner_table(
    total_turns: u32,
    assignments: &[(ParticipantId, Vec<u32>)],
) -> Vec<Option<ParticipantId>> {
    let mut owners = vec![None; total_turns as usize];
    for (participant, tokens) in assignments {
        for &token in tokens {
            if let Some(slot) = owners.get_mut(token as usize) {
                *slot = Some(*participant);
            }
        }
    }
    owners
}

/// Tokens each participant receives, tiered so larger lobbies get fewer.
pub fn tokens_per_participant<R: Rng + ?Sized>(active: usize, rng: &mut R) -> u32 {
    if active < 5 {
        rng.gen_range(5..10)
    } else if active < 10 {
        rng.gen_range(3..5)
    } else {
        rng.gen_range(2..3)
    }
}

/// Plans a round for `active` participants with tiered sizing drawn from `seed`.
pub fn plan_round(
    active: &[ParticipantId],
    round_number: u32,
    seed: u64,
) -> Result<RoundPlan, GameError> {
    if active.is_empty() {
        return Err(GameError::MalformedPlan);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let per_participant = tokens_per_participant(active.len(), &mut rng);
    distribute(active, round_number, per_participant, &mut rng)
}

/// Plans a round with a fixed block size instead of the tiered draw.
pub fn plan_round_sized(
    active: &[ParticipantId],
    round_number: u32,
    tokens_per_participant: u32,
    seed: u64,
) -> Result<RoundPlan, GameError> {
    if active.is_empty() || tokens_per_participant == 0 {
        return Err(GameError::MalformedPlan);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    distribute(active, round_number, tokens_per_participant, &mut rng)
}

fn distribute(
    active: &[ParticipantId],
    round_number: u32,
    per_participant: u32,
    rng: &mut StdRng,
) -> Result<RoundPlan, GameError> {
    let total_turns = active.len() as u32 * per_participant;
    let permutation = shuffle_with(total_turns as usize, rng);

    let assignments = active
        .iter()
        .zip(permutation.chunks(per_participant as usize))
        .map(|(participant, block)| {
            let mut tokens = block.to_vec();
            tokens.sort_unstable();
            (*participant, tokens)
        })
        .collect();

    Ok(RoundPlan {
        round_number,
        tokens_per_participant: per_participant,
        total_turns,
        assignments,
    })
}
