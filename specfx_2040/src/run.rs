use arrayvec::ArrayVec;

use specfx::context::Context;
use specfx::controls::{Knobs, SpectralControls};
use specfx::DualMonoEngine;

use crate::{BLOCK_SIZE, SAMPLE_RATE};

/// The board side of the audio loop
pub trait Frontend {
    /// Raw 16-bit readings of pot 1, pot 2, CV 1 and CV 2
    fn read_knobs(&mut self) -> [u16; 4];
    fn read_audio(&mut self, left: &mut [f32], right: &mut [f32]);
    fn write_audio(&mut self, left: &[f32], right: &[f32]);
}

fn zero_block() -> ArrayVec<f32, BLOCK_SIZE> {
    let mut block = ArrayVec::new();
    while block.try_push(0.0).is_ok() {}
    block
}

pub fn run(engine: &mut DualMonoEngine<f32>, frontend: &mut impl Frontend) -> ! {
    const CONTEXT: Context<f32> = Context::new(SAMPLE_RATE);
    engine.init(CONTEXT);
    let mut in_l = zero_block();
    let mut in_r = zero_block();
    let mut out_l = zero_block();
    let mut out_r = zero_block();
    loop {
        let knobs = Knobs::<f32>::from_raw(frontend.read_knobs());
        let controls = SpectralControls::from_knobs(&knobs);
        let mut settings = *engine.settings();
        settings.time = controls.time;
        settings.vibe = controls.vibe;
        engine.set_settings(settings);
        frontend.read_audio(in_l.as_mut_slice(), in_r.as_mut_slice());
        engine.process_block(
            [in_l.as_slice(), in_r.as_slice()],
            [out_l.as_mut_slice(), out_r.as_mut_slice()],
        );
        frontend.write_audio(out_l.as_slice(), out_r.as_slice());
    }
}
