//! AGI command tables and a linear bytecode decoder
//!
//! Only enough of the instruction set is understood to walk a script from
//! start to end: argument counts, the control flow bytes (`if`, `or`,
//! `not`, `goto`) and the variable length `said` test. Which argument of a
//! command names a message is recorded so text references can be found.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::{Error, Result};

/// Opens a condition block; also closes the condition list
pub const IF: u8 = 0xFF;
/// Unconditional relative jump
pub const GOTO: u8 = 0xFE;
/// Negates the next test
pub const NOT: u8 = 0xFD;
/// Brackets a group of alternatives
pub const OR: u8 = 0xFC;
/// Test with a count byte and `count` little-endian word groups
pub const SAID: u8 = 0x0E;

/// Static description of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Mnemonic
    pub name: &'static str,
    /// Number of argument bytes
    pub args: u8,
    /// Index of the argument holding a message number
    pub message_arg: Option<u8>,
}

const fn cmd(name: &'static str, args: u8) -> Command {
    Command {
        name,
        args,
        message_arg: None,
    }
}

const fn msg(name: &'static str, args: u8, message_arg: u8) -> Command {
    Command {
        name,
        args,
        message_arg: Some(message_arg),
    }
}

/// Action commands, indexed by opcode
pub static ACTIONS: [Command; 183] = [
    cmd("return", 0),
    cmd("increment", 1),
    cmd("decrement", 1),
    cmd("assignn", 2),
    cmd("assignv", 2),
    cmd("addn", 2),
    cmd("addv", 2),
    cmd("subn", 2),
    cmd("subv", 2),
    cmd("lindirectv", 2),
    cmd("rindirect", 2),
    cmd("lindirectn", 2),
    cmd("set", 1),
    cmd("reset", 1),
    cmd("toggle", 1),
    cmd("set.v", 1),
    cmd("reset.v", 1),
    cmd("toggle.v", 1),
    cmd("new.room", 1),
    cmd("new.room.v", 1),
    cmd("load.logics", 1),
    cmd("load.logics.v", 1),
    cmd("call", 1),
    cmd("call.v", 1),
    cmd("load.pic", 1),
    cmd("draw.pic", 1),
    cmd("show.pic", 0),
    cmd("discard.pic", 1),
    cmd("overlay.pic", 1),
    cmd("show.pri.screen", 0),
    cmd("load.view", 1),
    cmd("load.view.v", 1),
    cmd("discard.view", 1),
    cmd("animate.obj", 1),
    cmd("unanimate.all", 0),
    cmd("draw", 1),
    cmd("erase", 1),
    cmd("position", 3),
    cmd("position.v", 3),
    cmd("get.posn", 3),
    cmd("reposition", 3),
    cmd("set.view", 2),
    cmd("set.view.v", 2),
    cmd("set.loop", 2),
    cmd("set.loop.v", 2),
    cmd("fix.loop", 1),
    cmd("release.loop", 1),
    cmd("set.cel", 2),
    cmd("set.cel.v", 2),
    cmd("last.cel", 2),
    cmd("current.cel", 2),
    cmd("current.loop", 2),
    cmd("current.view", 2),
    cmd("number.of.loops", 2),
    cmd("set.priority", 2),
    cmd("set.priority.v", 2),
    cmd("release.priority", 1),
    cmd("get.priority", 2),
    cmd("stop.update", 1),
    cmd("start.update", 1),
    cmd("force.update", 1),
    cmd("ignore.horizon", 1),
    cmd("observe.horizon", 1),
    cmd("set.horizon", 1),
    cmd("object.on.water", 1),
    cmd("object.on.land", 1),
    cmd("object.on.anything", 1),
    cmd("ignore.objs", 1),
    cmd("observe.objs", 1),
    cmd("distance", 3),
    cmd("stop.cycling", 1),
    cmd("start.cycling", 1),
    cmd("normal.cycle", 1),
    cmd("end.of.loop", 2),
    cmd("reverse.cycle", 1),
    cmd("reverse.loop", 2),
    cmd("cycle.time", 2),
    cmd("stop.motion", 1),
    cmd("start.motion", 1),
    cmd("step.size", 2),
    cmd("step.time", 2),
    cmd("move.obj", 5),
    cmd("move.obj.v", 5),
    cmd("follow.ego", 3),
    cmd("wander", 1),
    cmd("normal.motion", 1),
    cmd("set.dir", 2),
    cmd("get.dir", 2),
    cmd("ignore.blocks", 1),
    cmd("observe.blocks", 1),
    cmd("block", 4),
    cmd("unblock", 0),
    cmd("get", 1),
    cmd("get.v", 1),
    cmd("drop", 1),
    cmd("put", 2),
    cmd("put.v", 2),
    cmd("get.room.v", 2),
    cmd("load.sound", 1),
    cmd("sound", 2),
    cmd("stop.sound", 0),
    msg("print", 1, 0),
    cmd("print.v", 1),
    msg("display", 3, 2),
    cmd("display.v", 3),
    cmd("clear.lines", 3),
    cmd("text.screen", 0),
    cmd("graphics", 0),
    msg("set.cursor.char", 1, 0),
    cmd("set.text.attribute", 2),
    cmd("shake.screen", 1),
    cmd("configure.screen", 3),
    cmd("status.line.on", 0),
    cmd("status.line.off", 0),
    msg("set.string", 2, 1),
    msg("get.string", 5, 1),
    cmd("word.to.string", 2),
    cmd("parse", 1),
    msg("get.num", 2, 0),
    cmd("prevent.input", 0),
    cmd("accept.input", 0),
    cmd("set.key", 3),
    cmd("add.to.pic", 7),
    cmd("add.to.pic.v", 7),
    cmd("status", 0),
    cmd("save.game", 0),
    cmd("restore.game", 0),
    cmd("init.disk", 0),
    cmd("restart.game", 0),
    cmd("show.obj", 1),
    cmd("random", 3),
    cmd("program.control", 0),
    cmd("player.control", 0),
    cmd("obj.status.v", 1),
    cmd("quit", 1),
    cmd("show.mem", 0),
    cmd("pause", 0),
    cmd("echo.line", 0),
    cmd("cancel.line", 0),
    cmd("init.joy", 0),
    cmd("toggle.monitor", 0),
    cmd("version", 0),
    cmd("script.size", 1),
    msg("set.game.id", 1, 0),
    msg("log", 1, 0),
    cmd("set.scan.start", 0),
    cmd("reset.scan.start", 0),
    cmd("reposition.to", 3),
    cmd("reposition.to.v", 3),
    cmd("trace.on", 0),
    cmd("trace.info", 3),
    msg("print.at", 4, 0),
    cmd("print.at.v", 4),
    cmd("discard.view.v", 1),
    cmd("clear.text.rect", 5),
    cmd("set.upper.left", 2),
    msg("set.menu", 1, 0),
    msg("set.menu.item", 2, 0),
    cmd("submit.menu", 0),
    cmd("enable.item", 1),
    cmd("disable.item", 1),
    cmd("menu.input", 0),
    cmd("show.obj.v", 1),
    cmd("open.dialogue", 0),
    cmd("close.dialogue", 0),
    cmd("mul.n", 2),
    cmd("mul.v", 2),
    cmd("div.n", 2),
    cmd("div.v", 2),
    cmd("close.window", 0),
    cmd("set.simple", 1),
    cmd("push.script", 0),
    cmd("pop.script", 0),
    cmd("hold.key", 0),
    cmd("set.pri.base", 1),
    cmd("discard.sound", 1),
    cmd("hide.mouse", 0),
    cmd("allow.menu", 1),
    cmd("show.mouse", 0),
    cmd("fence.mouse", 4),
    cmd("mouse.posn", 2),
    cmd("release.key", 0),
    cmd("adj.ego.move.to.x.y", 0),
];

/// Test commands, indexed by opcode. `said` has a variable argument list.
pub static TESTS: [Command; 20] = [
    cmd("true", 0),
    cmd("equaln", 2),
    cmd("equalv", 2),
    cmd("lessn", 2),
    cmd("lessv", 2),
    cmd("greatern", 2),
    cmd("greaterv", 2),
    cmd("isset", 1),
    cmd("issetv", 1),
    cmd("has", 1),
    cmd("obj.in.room", 2),
    cmd("posn", 5),
    cmd("controller", 1),
    cmd("have.key", 0),
    cmd("said", 0),
    cmd("compare.strings", 2),
    cmd("obj.in.box", 5),
    cmd("center.posn", 5),
    cmd("right.posn", 5),
    cmd("in.motion.using.mouse", 0),
];

/// Action command for `opcode`
pub fn action(opcode: u8) -> Option<&'static Command> {
    ACTIONS.get(opcode as usize)
}

/// Test command for `opcode`
pub fn test(opcode: u8) -> Option<&'static Command> {
    TESTS.get(opcode as usize)
}

/// One element of a condition list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `or` bracket
    Or,
    /// `not` prefix
    Not,
    /// A test command
    Test {
        /// Test opcode
        opcode: u8,
        /// Argument bytes (for `said`, the little-endian word groups)
        args: Vec<u8>,
    },
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Action command
    Action {
        /// Position in the bytecode
        offset: usize,
        /// Opcode
        opcode: u8,
        /// Argument bytes
        args: Vec<u8>,
    },
    /// Condition block header; the body follows inline
    If {
        /// Position in the bytecode
        offset: usize,
        /// Condition list
        conditions: Vec<Condition>,
        /// Size of the body
        skip: u16,
    },
    /// Relative jump
    Goto {
        /// Position in the bytecode
        offset: usize,
        /// Jump distance from the end of the instruction
        distance: i16,
    },
}

impl Instruction {
    /// Position of the instruction in the bytecode
    pub fn offset(&self) -> usize {
        match self {
            Instruction::Action { offset, .. }
            | Instruction::If { offset, .. }
            | Instruction::Goto { offset, .. } => *offset,
        }
    }

    /// Message number referenced by this instruction, if any
    pub fn message(&self) -> Option<u8> {
        match self {
            Instruction::Action { opcode, args, .. } => {
                let index = action(*opcode)?.message_arg?;
                args.get(index as usize).copied()
            }
            _ => None,
        }
    }
}

/// Decode `bytecode` from start to end
pub fn decode(bytecode: &[u8]) -> Result<Vec<Instruction>> {
    let mut cursor = Cursor::new(bytecode);
    let mut instructions = Vec::new();

    while (cursor.position() as usize) < bytecode.len() {
        let offset = cursor.position() as usize;
        let opcode = read_u8(&mut cursor, offset)?;
        let instruction = match opcode {
            IF => {
                let conditions = decode_conditions(&mut cursor, offset)?;
                let skip = read_u16(&mut cursor, offset)?;
                Instruction::If {
                    offset,
                    conditions,
                    skip,
                }
            }
            GOTO => Instruction::Goto {
                offset,
                distance: read_u16(&mut cursor, offset)? as i16,
            },
            _ => {
                let command = action(opcode).ok_or_else(|| {
                    Error::format(format!("Unknown action {opcode:#04x} at offset {offset:#x}"))
                })?;
                let args = read_args(&mut cursor, command.args as usize, offset)?;
                Instruction::Action {
                    offset,
                    opcode,
                    args,
                }
            }
        };
        log::trace!("{instruction:?}");
        instructions.push(instruction);
    }

    Ok(instructions)
}

fn decode_conditions(cursor: &mut Cursor<&[u8]>, start: usize) -> Result<Vec<Condition>> {
    let mut conditions = Vec::new();
    loop {
        let offset = cursor.position() as usize;
        let opcode = read_u8(cursor, start)?;
        let condition = match opcode {
            IF => return Ok(conditions),
            OR => Condition::Or,
            NOT => Condition::Not,
            SAID => {
                let count = read_u8(cursor, start)? as usize;
                Condition::Test {
                    opcode,
                    args: read_args(cursor, count * 2, start)?,
                }
            }
            _ => {
                let command = test(opcode).ok_or_else(|| {
                    Error::format(format!("Unknown test {opcode:#04x} at offset {offset:#x}"))
                })?;
                Condition::Test {
                    opcode,
                    args: read_args(cursor, command.args as usize, start)?,
                }
            }
        };
        conditions.push(condition);
    }
}

fn read_u8(cursor: &mut Cursor<&[u8]>, start: usize) -> Result<u8> {
    cursor.read_u8().map_err(|_| truncated(start))
}

fn read_u16(cursor: &mut Cursor<&[u8]>, start: usize) -> Result<u16> {
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| truncated(start))
}

fn read_args(cursor: &mut Cursor<&[u8]>, count: usize, start: usize) -> Result<Vec<u8>> {
    let pos = cursor.position() as usize;
    let args = cursor
        .get_ref()
        .get(pos..pos + count)
        .ok_or_else(|| truncated(start))?
        .to_vec();
    cursor.set_position((pos + count) as u64);
    Ok(args)
}

fn truncated(offset: usize) -> Error {
    Error::format(format!(
        "Instruction at offset {offset:#x} runs past the end of the bytecode"
    ))
}
