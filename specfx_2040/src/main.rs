#![no_std]
#![no_main]

use panic_halt as _;
use rp_pico::entry;

use specfx::DualMonoEngine;

mod run;

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 32;

static mut ENGINE: DualMonoEngine<f32> = DualMonoEngine::new();

/// Mid-scale knobs and silent audio.
// TODO: replace with the PIO I2S codec driver and ADC scan once the board
// pinout is fixed.
struct IdleFrontend;

impl run::Frontend for IdleFrontend {
    fn read_knobs(&mut self) -> [u16; 4] {
        [u16::MAX / 2; 4]
    }
    fn read_audio(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
    }
    fn write_audio(&mut self, _left: &[f32], _right: &[f32]) {}
}

#[entry]
fn start() -> ! {
    let engine = unsafe { &mut *core::ptr::addr_of_mut!(ENGINE) };
    run::run(engine, &mut IdleFrontend)
}
