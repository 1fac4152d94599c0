//! Puzzle Program Instructions
//!
//! The player-authored instruction tree and its expansion into a flat,
//! repeat-free action list.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{constants::MAX_FLAT_ACTIONS, error::ProgramError, state::Direction};

/// One authored instruction block
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Instruction {
    /// Step one cell in a direction
    Move(Direction),

    /// Pick up the target under the avatar, if any
    Collect,

    /// Run `children` in order, `count` times
    Repeat {
        children: Vec<Instruction>,
        count: u32,
    },
}

impl Instruction {
    pub fn repeat(count: u32, children: Vec<Instruction>) -> Self {
        Instruction::Repeat { children, count }
    }
}

/// Atomic action left after expansion
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Move(Direction),
    Collect,
}

/// Top-level ordered arrangement of instructions
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq,
)]
#[serde(transparent)]
pub struct Program(Vec<Instruction>);

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self(instructions)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deepest repeat nesting (0 for a flat program)
    pub fn repeat_depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(&[Instruction], usize)> = vec![(self.0.as_slice(), 0)];

        while let Some((nodes, depth)) = pending.pop() {
            for node in nodes {
                if let Instruction::Repeat { children, .. } = node {
                    deepest = deepest.max(depth + 1);
                    pending.push((children.as_slice(), depth + 1));
                }
            }
        }
        deepest
    }

    /// Check the tree shape without expanding it
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.0.is_empty() {
            return Err(ProgramError::Empty);
        }

        let mut pending: Vec<(&[Instruction], usize)> = vec![(self.0.as_slice(), 0)];
        while let Some((nodes, depth)) = pending.pop() {
            for node in nodes {
                if let Instruction::Repeat { children, count } = node {
                    if *count == 0 {
                        return Err(ProgramError::InvalidRepeatCount {
                            count: *count,
                            depth: depth + 1,
                        });
                    }
                    pending.push((children.as_slice(), depth + 1));
                }
            }
        }
        Ok(())
    }

    /// Unroll every repeat, depth-first, preserving child order
    pub fn expand(&self) -> Result<Vec<Action>, ProgramError> {
        self.validate()?;

        let mut actions = Vec::new();
        expand_into(&self.0, &mut actions)?;
        Ok(actions)
    }

    /// Canonical byte encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("Program serialization should not fail")
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, borsh::io::Error> {
        borsh::from_slice(data)
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self(instructions)
    }
}

fn push_action(actions: &mut Vec<Action>, action: Action) -> Result<(), ProgramError> {
    if actions.len() >= MAX_FLAT_ACTIONS {
        return Err(ProgramError::TooManyActions {
            limit: MAX_FLAT_ACTIONS,
        });
    }
    actions.push(action);
    Ok(())
}

/// A repeat body being expanded
struct Frame<'a> {
    nodes: &'a [Instruction],
    next: usize,
    /// Where this body's first pass starts in the output
    body_start: usize,
    count: u32,
}

fn expand_into(nodes: &[Instruction], actions: &mut Vec<Action>) -> Result<(), ProgramError> {
    let mut stack = vec![Frame {
        nodes,
        next: 0,
        body_start: actions.len(),
        count: 1,
    }];

    while let Some(frame) = stack.last_mut() {
        let nodes = frame.nodes;
        match nodes.get(frame.next) {
            Some(node) => {
                frame.next += 1;
                match node {
                    Instruction::Move(direction) => push_action(actions, Action::Move(*direction))?,
                    Instruction::Collect => push_action(actions, Action::Collect)?,
                    Instruction::Repeat { children, count } => stack.push(Frame {
                        nodes: children,
                        next: 0,
                        body_start: actions.len(),
                        count: *count,
                    }),
                }
            }
            None => {
                if let Some(done) = stack.pop() {
                    repeat_body(actions, done.body_start, done.count)?;
                }
            }
        }
    }
    Ok(())
}

/// Copy the first pass of a body for the remaining `count - 1` passes
fn repeat_body(actions: &mut Vec<Action>, body_start: usize, count: u32) -> Result<(), ProgramError> {
    let body_len = actions.len() - body_start;
    if body_len == 0 || count <= 1 {
        return Ok(());
    }

    let passes = (count - 1) as usize;
    match passes.checked_mul(body_len) {
        Some(extra) if actions.len() + extra <= MAX_FLAT_ACTIONS => {}
        _ => {
            return Err(ProgramError::TooManyActions {
                limit: MAX_FLAT_ACTIONS,
            })
        }
    }

    actions.reserve(passes * body_len);
    for _ in 0..passes {
        actions.extend_from_within(body_start..body_start + body_len);
    }
    Ok(())
}

impl Drop for Instruction {
    fn drop(&mut self) {
        // Flatten nested bodies so dropping a deep tree does not recurse
        if let Instruction::Repeat { children, .. } = self {
            let mut pending = std::mem::take(children);
            while let Some(mut node) = pending.pop() {
                if let Instruction::Repeat { children, .. } = &mut node {
                    pending.append(children);
                }
            }
        }
    }
}
