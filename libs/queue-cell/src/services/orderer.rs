use crate::models::{QueuePosition, QueueToken, TokenStatus};

/// Recompute waiting positions for one scope's token set.
///
/// Emergency tokens rank ahead of all others regardless of arrival order;
/// within a tier the order is creation order (ascending token number).
/// Tokens outside `waiting` lose their position and are absent from the
/// returned ordering. Deterministic and idempotent: rerunning on an
/// unchanged set touches nothing but `position`, and leaves those values
/// identical.
pub fn reorder(tokens: &mut [QueueToken]) -> Vec<QueuePosition> {
    let mut waiting: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status == TokenStatus::Waiting)
        .map(|(i, _)| i)
        .collect();

    waiting.sort_by(|&a, &b| {
        tokens[b]
            .is_emergency
            .cmp(&tokens[a].is_emergency)
            .then(tokens[a].token_number.cmp(&tokens[b].token_number))
    });

    let mut ordering = Vec::with_capacity(waiting.len());
    for (rank, &idx) in waiting.iter().enumerate() {
        let position = (rank + 1) as u32;
        tokens[idx].position = Some(position);
        ordering.push(QueuePosition {
            token_id: tokens[idx].id,
            token_number: tokens[idx].token_number,
            position,
            is_emergency: tokens[idx].is_emergency,
        });
    }

    for token in tokens.iter_mut() {
        if token.status != TokenStatus::Waiting {
            token.position = None;
        }
    }

    ordering
}
