#![no_main]

use libfuzzer_sys::fuzz_target;
use vm8_core::{
    disassemble, pack_program, step, step_packed, CpuState, Decoder, Encoding, Status, FLAG_HALTED,
};

const STEP_LIMIT: usize = 512;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let _ = Decoder::decode_verbatim([data[0], data[1], data[2]]);
    let _ = Decoder::decode_packed([data[0], data[1]]);
    let _ = pack_program(&data[..data.len() - data.len() % 3]);

    for encoding in [Encoding::Verbatim, Encoding::Packed] {
        let mut state = CpuState::default();
        let image = &data[..data.len().min(state.layout.code_size())];
        if state.load_program(image).is_err() {
            return;
        }
        let _ = disassemble(&state.memory, 0, 8, encoding);

        for _ in 0..STEP_LIMIT {
            let status = match encoding {
                Encoding::Verbatim => step(&mut state),
                Encoding::Packed => step_packed(&mut state),
            };
            if let Status::Halted(cause) = status {
                assert!(state.regs.flag_is_set(FLAG_HALTED));
                assert_eq!(state.halt_cause(), Some(cause));
                break;
            }
            assert!(state.regs.sp() >= state.layout.stack_floor());
        }
    }
});
