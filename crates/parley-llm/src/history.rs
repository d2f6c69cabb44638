use crate::types::{Role, Turn};

/// Collapse back-to-back user turns into one, joined by a newline
///
/// Some providers reject consecutive same-role user messages, so the
/// sequence handed to a provider must never contain two in a row.
pub fn merge_user_turns(turns: Vec<Turn>) -> Vec<Turn> {
    let mut merged: Vec<Turn> = Vec::with_capacity(turns.len());

    for turn in turns {
        match merged.last_mut() {
            Some(last) if last.is_user() && turn.is_user() => {
                last.append_line(&turn.content);
            }
            _ => merged.push(turn),
        }
    }

    merged
}

/// Build the provider-facing sequence: optional system prompt, then history
pub fn with_system_prompt(system_prompt: &str, turns: Vec<Turn>) -> Vec<Turn> {
    let history = merge_user_turns(
        turns
            .into_iter()
            .filter(|t| t.role != Role::System)
            .collect(),
    );

    if system_prompt.trim().is_empty() {
        return history;
    }

    let mut conversation = Vec::with_capacity(history.len() + 1);
    conversation.push(Turn::system(system_prompt));
    conversation.extend(history);
    conversation
}
