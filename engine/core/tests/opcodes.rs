mod common;

use common::*;
use proptest::prelude::*;
use vge_bytecode::{Assembler, Condition, DecodeError, Instruction::*, Operand};
use vge_core::audio_queue::AudioCommand;
use vge_core::registers::var;
use vge_core::tasks::TaskSlot;
use vge_core::{EngineConfig, EngineError, Fault, PlayerInput};

fn run_once(insns: &[vge_bytecode::Instruction]) -> TestEngine {
    let mut engine = boot_with(program(insns), vec![]);
    engine.run_frame().expect("frame runs");
    engine
}

#[test]
fn arithmetic_wraps_on_sixteen_bits() {
    let engine = run_once(&[
        MoveConst { dst: 1, value: i16::MAX },
        AddConst { dst: 1, value: 1 },
        MoveConst { dst: 2, value: 5 },
        Move { dst: 3, src: 2 },
        Add { dst: 3, src: 2 },
        Sub { dst: 2, src: 3 },
        MoveConst { dst: 4, value: -1 },
        And { dst: 4, mask: 0x0FF0 },
        Or { dst: 4, mask: 0x8000 },
        MoveConst { dst: 5, value: -32768 },
        Shr { dst: 5, shift: 15 },
        MoveConst { dst: 6, value: 3 },
        Shl { dst: 6, shift: 14 },
        Kill,
    ]);

    let regs = &engine.state().registers;
    assert_eq!(regs.get(1), i16::MIN);
    assert_eq!(regs.get(2), -5);
    assert_eq!(regs.get(3), 10);
    assert_eq!(regs.get(4), 0x8FF0u16 as i16);
    assert_eq!(regs.get(5), 1);
    assert_eq!(regs.get(6), 0xC000u16 as i16);
}

#[test]
fn decrement_loop_runs_counter_times() {
    let mut asm = Assembler::new();
    asm.emit(MoveConst { dst: 0, value: 3 });
    let top = asm.here();
    asm.emit(AddConst { dst: 1, value: 2 })
        .emit(DecrementJumpNonZero { counter: 0, target: top })
        .emit(Kill);

    let mut engine = boot_with(asm.finish(), vec![]);
    engine.run_frame().unwrap();
    assert_eq!(engine.state().registers.get(1), 6);
    assert_eq!(engine.state().registers.get(0), 0);
}

#[test]
fn call_returns_after_the_call_site() {
    let mut asm = Assembler::new();
    asm.emit(Call { target: 0x20 })
        .emit(MoveConst { dst: 2, value: 2 })
        .emit(Kill);
    asm.align_to(0x20)
        .emit(MoveConst { dst: 1, value: 1 })
        .emit(Return);

    let mut engine = boot_with(asm.finish(), vec![]);
    engine.run_frame().unwrap();
    assert_eq!(engine.state().registers.get(1), 1);
    assert_eq!(engine.state().registers.get(2), 2);
}

#[test]
fn return_without_call_is_fatal() {
    let mut engine = boot_with(program(&[Yield, Return]), vec![]);
    engine.run_frame().unwrap();
    match engine.run_frame() {
        Err(EngineError::Script { task, ip, opcode, fault }) => {
            assert_eq!((task, ip, opcode), (0, 1, 0x05));
            assert_eq!(fault, Fault::StackUnderflow);
        }
        other => panic!("expected a script fault, got {other:?}"),
    }
}

#[test]
fn runaway_recursion_overflows_the_call_stack() {
    let mut engine = boot_with(program(&[Call { target: 0 }]), vec![]);
    match engine.run_frame() {
        Err(EngineError::Script { ip, opcode, fault, .. }) => {
            assert_eq!((ip, opcode), (0, 0x04));
            assert_eq!(fault, Fault::StackOverflow);
        }
        other => panic!("expected a script fault, got {other:?}"),
    }
}

#[test]
fn undefined_opcode_reports_task_ip_and_byte() {
    let mut asm = Assembler::new();
    asm.emit(StartTask { task: 3, target: 0x10 }).emit(Kill);
    let mut code = asm.align_to(0x10).emit(MoveConst { dst: 0, value: 0 }).finish();
    code.push(0x1B);

    let mut engine = boot_with(code, vec![]);
    engine.run_frame().unwrap();
    match engine.run_frame() {
        Err(EngineError::Script { task, ip, opcode, fault }) => {
            assert_eq!((task, ip, opcode), (3, 0x14, 0x1B));
            assert_eq!(fault, Fault::Decode(DecodeError::UndefinedInstruction { offset: 0x14, opcode: 0x1B }));
        }
        other => panic!("expected a script fault, got {other:?}"),
    }
}

#[test]
fn running_off_the_segment_is_fatal() {
    let mut engine = boot_with(program(&[MoveConst { dst: 0, value: 1 }]), vec![]);
    let err = engine.run_frame().unwrap_err();
    assert!(matches!(
        err,
        EngineError::Script { ip: 4, opcode: 0, fault: Fault::Decode(DecodeError::EndOfSegment { .. }), .. }
    ));
}

fn condition_holds(bits: u8, lhs: i16, rhs: i16) -> bool {
    match bits {
        0 => lhs == rhs,
        1 => lhs != rhs,
        2 => lhs > rhs,
        3 => lhs >= rhs,
        4 => lhs < rhs,
        5 => lhs <= rhs,
        _ => false,
    }
}

fn rhs_operand() -> impl Strategy<Value = (Operand, i16)> {
    prop_oneof![
        any::<i16>().prop_map(|v| (Operand::Register(1), v)),
        any::<i16>().prop_map(|v| (Operand::Word(v), v)),
        any::<i8>().prop_map(|v| (Operand::Byte(v as i16), v as i16)),
    ]
}

proptest! {
    #[test]
    fn conditional_jump_length_does_not_depend_on_outcome(
        bits in 0u8..8,
        lhs in any::<i16>(),
        (rhs, rhs_value) in rhs_operand(),
    ) {
        let mut asm = Assembler::new();
        asm.emit(MoveConst { dst: 0, value: lhs })
            .emit(MoveConst { dst: 1, value: rhs_value });
        let jump = asm.here();
        asm.emit(JumpIf { condition: Condition::from_bits(bits), lhs: 0, rhs, target: 0 })
            .emit(MoveConst { dst: 9, value: 1 })
            .emit(Kill);
        let taken = asm.here();
        asm.emit(MoveConst { dst: 9, value: 2 }).emit(Kill);
        asm.patch_target(jump, taken);

        let mut engine = boot_with(asm.finish(), vec![]);
        engine.run_frame().unwrap();

        let expected = if condition_holds(bits, lhs, rhs_value) { 2 } else { 1 };
        prop_assert_eq!(engine.state().registers.get(9), expected);
    }
}

#[test]
fn audio_is_forwarded_in_order() {
    let engine = run_once(&[
        PlaySound { resource: 0x21, freq: 30, volume: 63, channel: 2 },
        PlayMusic { resource: 0x07, delay: 0x100, position: 1 },
        Kill,
    ]);
    assert_eq!(
        engine.audio.commands,
        vec![
            AudioCommand::StopAll,
            AudioCommand::PlaySound { resource: 0x21, freq: 30, volume: 63, channel: 2 },
            AudioCommand::PlayMusic { resource: 0x07, delay: 0x100, position: 1 },
        ]
    );
}

#[test]
fn load_resource_switches_part_at_next_frame() {
    let mut resources = MemResources::default();
    resources.parts.insert(
        BOOT_PART,
        MemPart::with_code(program(&[MoveConst { dst: 5, value: 1 }, LoadResource { resource: 16002 }, Yield])),
    );
    resources
        .parts
        .insert(16002, MemPart::with_code(program(&[Add { dst: 6, src: 5 }, MoveConst { dst: 7, value: 7 }, Kill])));
    let mut engine = boot(resources, test_config());

    engine.run_frame().unwrap();
    assert_eq!(engine.state().part, Some(BOOT_PART));
    assert_eq!(engine.state().pending_part, Some(16002));

    engine.run_frame().unwrap();
    let state = engine.state();
    assert_eq!(state.part, Some(16002));
    assert_eq!(state.registers.get(5), 0);
    assert_eq!(state.registers.get(6), 0);
    assert_eq!(state.registers.get(7), 7);
    assert_eq!(engine.audio.commands, vec![AudioCommand::StopAll, AudioCommand::StopAll]);
}

#[test]
fn load_resource_zero_and_unknown_ids_are_ignored() {
    let engine = run_once(&[LoadResource { resource: 0 }, LoadResource { resource: 0x12 }, Kill]);
    assert_eq!(engine.state().pending_part, None);
    assert!(engine.state().pages.page(0).iter().all(|&p| p == 0));
}

#[test]
fn input_is_mirrored_before_tasks_run() {
    let mut engine = boot_with(
        program(&[
            Move { dst: 0x10, src: var::HERO_POS_LEFT_RIGHT },
            Move { dst: 0x11, src: var::HERO_ACTION_POS_MASK },
            Move { dst: 0x12, src: var::LAST_KEYCHAR },
            Kill,
        ]),
        vec![],
    );
    engine.set_input(PlayerInput { right: true, down: true, action: true, last_char: Some(b'q'), ..Default::default() });
    engine.run_frame().unwrap();

    let regs = &engine.state().registers;
    assert_eq!(regs.get(0x10), 1);
    assert_eq!(regs.get(0x11), 1 | 4 | 0x80);
    assert_eq!(regs.get(0x12), b'q' as i16);
    assert_eq!(regs.get(var::HERO_POS_JUMP_DOWN), 1);
}

#[test]
fn display_update_paces_frames_unless_fast() {
    let code = program(&[
        MoveConst { dst: var::PAUSE_SLICES, value: 5 },
        MoveConst { dst: var::FRAME_FLAG, value: 9 },
        UpdateDisplay { page: 0xFE },
        Yield,
        Kill,
    ]);

    let mut resources = MemResources::default();
    resources.parts.insert(BOOT_PART, MemPart::with_code(code.clone()));
    let mut paced = boot(resources, EngineConfig { fast_mode: false, ..test_config() });
    paced.presenter.now = 30;
    paced.run_frame().unwrap();
    assert_eq!(paced.presenter.sleeps, vec![70]);
    assert_eq!(paced.state().last_timestamp, 100);
    assert_eq!(paced.state().registers.get(var::FRAME_FLAG), 0);
    assert_eq!(paced.presenter.frames.len(), 1);

    let mut fast = boot_with(code, vec![]);
    fast.run_frame().unwrap();
    assert!(fast.presenter.sleeps.is_empty());
    assert_eq!(fast.state().frames_presented, 1);
}

#[test]
fn random_seed_register_is_filled_on_part_load() {
    let mut resources = MemResources::default();
    resources.parts.insert(BOOT_PART, MemPart::with_code(program(&[Kill])));
    let seeded = boot(resources, EngineConfig { seed_random_register: true, ..test_config() });
    let unseeded = boot_with(program(&[Kill]), vec![]);
    assert_eq!(unseeded.state().registers.get(var::RANDOM_SEED), 0);
    // only the seed register differs from a zeroed file
    let nonzero = seeded.state().registers.0.iter().enumerate().filter(|(_, &v)| v != 0).count();
    assert!(nonzero <= 1);
    assert_eq!(seeded.state().scheduler.active[0].entry, Some(0));
}

#[test]
fn snapshot_round_trip_restores_registers_and_tasks() {
    let mut asm = Assembler::new();
    asm.emit(StartTask { task: 6, target: 0x10 });
    let top = asm.here();
    asm.emit(AddConst { dst: 0, value: 1 }).emit(Yield).emit(Jump { target: top });
    asm.align_to(0x10).emit(Yield).emit(Kill);

    let mut engine = boot_with(asm.finish(), vec![]);
    engine.run_frame().unwrap();
    engine.run_frame().unwrap();
    let snapshot = engine.snapshot().unwrap();
    assert_eq!(snapshot.part, BOOT_PART);
    assert_eq!(snapshot.registers[0], 2);
    assert_eq!(snapshot.tasks[6].entry, Some(0x11));

    engine.run_frame().unwrap();
    engine.run_frame().unwrap();
    assert_eq!(engine.state().registers.get(0), 4);

    let bytes = snapshot.encode();
    let decoded = vge_core::Snapshot::decode(&bytes).unwrap();
    engine.restore(&decoded).unwrap();
    assert_eq!(engine.state().registers.get(0), 2);
    assert_eq!(engine.state().scheduler.active[6].entry, Some(0x11));

    engine.run_frame().unwrap();
    assert_eq!(engine.state().registers.get(0), 3);
    assert_eq!(engine.state().scheduler.active[6].entry, None);
}

#[test]
fn restored_paused_task_stays_paused() {
    let mut asm = Assembler::new();
    asm.emit(StartTask { task: 1, target: 0x20 }).emit(ChangeTasks { first: 1, last: 1, state: 1 });
    let top = asm.here();
    asm.emit(Yield).emit(Jump { target: top });
    asm.align_to(0x20).emit(AddConst { dst: 1, value: 1 }).emit(Yield).emit(Jump { target: 0x20 });
    let code = asm.finish();

    let mut engine = boot_with(code.clone(), vec![]);
    engine.run_frame().unwrap();
    engine.run_frame().unwrap();
    let snapshot = engine.snapshot().unwrap();
    assert_eq!(snapshot.tasks[1], TaskSlot { entry: Some(0x20), paused: true });
    assert_eq!(snapshot.registers[1], 0);

    let mut fresh = boot_with(code, vec![]);
    fresh.restore(&snapshot).unwrap();
    fresh.run_frame().unwrap();
    assert_eq!(fresh.state().registers.get(1), 0);
    assert_eq!(fresh.state().scheduler.active[1], TaskSlot { entry: Some(0x20), paused: true });
}
