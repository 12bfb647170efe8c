//! Message extraction, injection and reference scanning

use std::collections::{BTreeMap, BTreeSet};

use super::opcodes::{self, Condition, Instruction};
use super::script::LogicScript;
use crate::{Error, Result};

/// A command in the bytecode that names a message
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextReference {
    /// Position of the command in the bytecode
    pub offset: usize,
    /// Command mnemonic
    pub command: &'static str,
    /// Referenced message number
    pub message: u8,
}

/// How a message is reached from the bytecode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UsageKind {
    /// Named directly by at least one text command
    Referenced,
    /// Not named by any text command. Such text is usually shown through
    /// `print.v` and friends, whose message number lives in a variable.
    FreeFloating,
}

/// A message and the commands that use it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageUsage {
    /// Message number
    pub number: u8,
    /// Text
    pub text: String,
    /// Bytecode offsets of commands naming the message
    pub references: Vec<usize>,
    /// Whether any command names the message
    pub kind: UsageKind,
}

/// A `said` test and the word groups it matches
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaidTest {
    /// Position of the enclosing `if` in the bytecode
    pub offset: usize,
    /// Word groups in phrase order
    pub groups: Vec<u16>,
}

/// Present messages as `(number, text)` in message order
pub fn extract_messages(script: &LogicScript) -> Vec<(u8, String)> {
    script
        .messages()
        .iter()
        .zip(1u8..=u8::MAX)
        .filter_map(|(message, number)| message.as_ref().map(|text| (number, text.clone())))
        .collect()
}

/// Replace message texts, returning the rebuilt script.
///
/// Fails with [`Error::Format`] when a key names a message that does not
/// exist and with [`Error::Overflow`] when the rebuilt logic exceeds its
/// capacity or 16-bit addressing. Re-injecting extracted text yields a
/// script that encodes to the original bytes.
pub fn inject_messages(
    script: &LogicScript,
    replacements: &BTreeMap<u8, String>,
) -> Result<LogicScript> {
    let mut updated = script.clone();
    for (&number, text) in replacements {
        updated.set_message(number, text.as_str())?;
    }

    let size = updated.encode()?.len();
    log::debug!(
        "Injected {} messages, logic is now {size} bytes",
        replacements.len()
    );
    Ok(updated)
}

/// Every message reference made by a text command
pub fn scan_text_references(script: &LogicScript) -> Result<Vec<TextReference>> {
    let instructions = opcodes::decode(script.bytecode())?;
    Ok(instructions
        .iter()
        .filter_map(|instruction| {
            let message = instruction.message()?;
            let Instruction::Action { offset, opcode, .. } = instruction else {
                return None;
            };
            let command = opcodes::action(*opcode)?.name;
            Some(TextReference {
                offset: *offset,
                command,
                message,
            })
        })
        .collect())
}

/// Every present message with the commands that reference it.
///
/// Messages that no command names directly are reported as
/// [`UsageKind::FreeFloating`] so they are still offered for translation.
pub fn text_report(script: &LogicScript) -> Result<Vec<MessageUsage>> {
    let mut by_message: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for reference in scan_text_references(script)? {
        by_message
            .entry(reference.message)
            .or_default()
            .push(reference.offset);
    }

    Ok(extract_messages(script)
        .into_iter()
        .map(|(number, text)| {
            let references = by_message.remove(&number).unwrap_or_default();
            let kind = if references.is_empty() {
                UsageKind::FreeFloating
            } else {
                UsageKind::Referenced
            };
            MessageUsage {
                number,
                text,
                references,
                kind,
            }
        })
        .collect())
}

/// Check that every referenced message exists
pub fn check_references(script: &LogicScript) -> Result<()> {
    let missing: BTreeSet<(u8, usize)> = scan_text_references(script)?
        .into_iter()
        .filter(|reference| script.message(reference.message).is_none())
        .map(|reference| (reference.message, reference.offset))
        .collect();

    match missing.first() {
        None => Ok(()),
        Some(&(message, offset)) => Err(Error::format(format!(
            "Command at offset {offset:#x} references missing message {message} ({} dangling references)",
            missing.len()
        ))),
    }
}

/// Every `said` test in the bytecode, in bytecode order.
///
/// The word groups are what the parser compares against; resolve them
/// to words through the game's dictionary.
pub fn scan_said_tests(script: &LogicScript) -> Result<Vec<SaidTest>> {
    let mut tests = Vec::new();
    for instruction in opcodes::decode(script.bytecode())? {
        let Instruction::If {
            offset, conditions, ..
        } = instruction
        else {
            continue;
        };
        for condition in conditions {
            if let Condition::Test {
                opcode: opcodes::SAID,
                args,
            } = condition
            {
                tests.push(SaidTest {
                    offset,
                    groups: args
                        .chunks_exact(2)
                        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                        .collect(),
                });
            }
        }
    }
    Ok(tests)
}
