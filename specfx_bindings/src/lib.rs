use specfx::channel::SpectralChannel;
use specfx::context::Context;
use specfx::stereo::{NotchParams, StereoSpectral};
use specfx::stereo_engine::{StereoEngine, StereoEngineSettings};
use specfx::window::WindowShape;
use specfx::{Effect, EffectParams, HopSize, LfoWave, FFT_SIZE};

#[no_mangle]
pub static SPECFX_FFT_SIZE: u32 = FFT_SIZE as u32;
#[no_mangle]
pub static SPECFX_NUM_BINS: u32 = specfx::NUM_BINS as u32;

fn hop_from_u32(hop: u32) -> Option<HopSize> {
    HopSize::try_from(hop as usize).ok()
}

fn window_from_u8(shape: u8, kaiser_beta: f32) -> Option<[f32; FFT_SIZE]> {
    WindowShape::try_from(shape)
        .ok()
        .map(|shape| shape.build(kaiser_beta))
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SpecfxNotchParams {
    pub notch_distance: f32,
    pub phase_offset: f32,
    pub lfo_depth: f32,
    pub bin_rounding: f32,
    pub blur: f32,
    pub cutoff_hz: f32,
    pub xmix: f32,
    pub crossover: f32,
}

impl From<&SpecfxNotchParams> for NotchParams<f32> {
    fn from(value: &SpecfxNotchParams) -> Self {
        Self {
            notch_distance: value.notch_distance,
            phase_offset: value.phase_offset,
            lfo_depth: value.lfo_depth,
            bin_rounding: value.bin_rounding,
            blur: value.blur,
            cutoff_hz: value.cutoff_hz,
            xmix: value.xmix,
            crossover: value.crossover,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SpecfxStereoEngineSettings {
    pub notch: SpecfxNotchParams,
    pub mix: f32,
    pub lfo_rate: f32,
    pub lfo_wave: u8,
    pub wave: f32,
    pub overdrive: f32,
    pub block_size: u8,
}

impl TryFrom<&SpecfxStereoEngineSettings> for StereoEngineSettings<f32> {
    type Error = &'static str;
    fn try_from(value: &SpecfxStereoEngineSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            notch: NotchParams::from(&value.notch),
            mix: value.mix,
            lfo_rate: value.lfo_rate,
            lfo_wave: LfoWave::try_from(value.lfo_wave)?,
            wave: value.wave,
            overdrive: value.overdrive,
            block_size: value.block_size,
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn specfx_window_f32_fill(shape: u8, kaiser_beta: f32, out: *mut f32) -> i32 {
    if out.is_null() {
        return -1;
    }
    let table = match window_from_u8(shape, kaiser_beta) {
        Some(x) => x,
        None => return -1,
    };
    core::slice::from_raw_parts_mut(out, FFT_SIZE).copy_from_slice(&table);
    FFT_SIZE as i32
}

#[no_mangle]
pub extern "C" fn specfx_channel_f32_new() -> *mut SpectralChannel<f32> {
    Box::into_raw(Box::new(SpectralChannel::new()))
}

#[no_mangle]
pub unsafe extern "C" fn specfx_channel_f32_free(p: *mut SpectralChannel<f32>) {
    if !p.is_null() {
        let _ = Box::from_raw(p);
    }
}

#[no_mangle]
pub unsafe extern "C" fn specfx_channel_f32_init(
    p: *mut SpectralChannel<f32>,
    sample_rate: f32,
    shape: u8,
    kaiser_beta: f32,
) -> i32 {
    if p.is_null() || !(sample_rate > 0.0) {
        return -1;
    }
    let window = match window_from_u8(shape, kaiser_beta) {
        Some(x) => x,
        None => return -1,
    };
    (*p).init(Context::new(sample_rate), &window);
    0
}

#[no_mangle]
pub unsafe extern "C" fn specfx_channel_f32_set_window(
    p: *mut SpectralChannel<f32>,
    window: *const f32,
) -> i32 {
    if p.is_null() || window.is_null() {
        return -1;
    }
    let mut table = [0f32; FFT_SIZE];
    table.copy_from_slice(core::slice::from_raw_parts(window, FFT_SIZE));
    (*p).set_window(&table);
    0
}

#[no_mangle]
pub unsafe extern "C" fn specfx_channel_f32_set_hop(p: *mut SpectralChannel<f32>, hop: u32) -> i32 {
    if p.is_null() {
        return -1;
    }
    match hop_from_u32(hop) {
        Some(hop) => {
            (*p).set_hop_size(hop);
            0
        }
        None => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn specfx_channel_f32_process(
    p: *mut SpectralChannel<f32>,
    samples: u32,
    signal: *const f32,
    effect: u8,
    time: f32,
    vibe: f32,
    out: *mut f32,
) -> i32 {
    if p.is_null() || signal.is_null() || out.is_null() {
        return -1;
    }
    let effect = match Effect::try_from(effect) {
        Ok(x) => x,
        Err(_) => return -1,
    };
    let s = core::slice::from_raw_parts(signal, samples as usize);
    let o = core::slice::from_raw_parts_mut(out, samples as usize);
    (*p).process_block(s, o, effect, &EffectParams { time, vibe });
    samples as i32
}

#[no_mangle]
pub extern "C" fn specfx_stereo_f32_new() -> *mut StereoSpectral<f32> {
    Box::into_raw(Box::new(StereoSpectral::new()))
}

#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_f32_free(p: *mut StereoSpectral<f32>) {
    if !p.is_null() {
        let _ = Box::from_raw(p);
    }
}

#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_f32_init(
    p: *mut StereoSpectral<f32>,
    sample_rate: f32,
    shape: u8,
    kaiser_beta: f32,
) -> i32 {
    if p.is_null() || !(sample_rate > 0.0) {
        return -1;
    }
    let window = match window_from_u8(shape, kaiser_beta) {
        Some(x) => x,
        None => return -1,
    };
    (*p).init(Context::new(sample_rate), &window);
    0
}

#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_f32_set_window(
    p: *mut StereoSpectral<f32>,
    window: *const f32,
) -> i32 {
    if p.is_null() || window.is_null() {
        return -1;
    }
    let mut table = [0f32; FFT_SIZE];
    table.copy_from_slice(core::slice::from_raw_parts(window, FFT_SIZE));
    (*p).set_window(&table);
    0
}

#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_f32_set_hop(p: *mut StereoSpectral<f32>, hop: u32) -> i32 {
    if p.is_null() {
        return -1;
    }
    match hop_from_u32(hop) {
        Some(hop) => {
            (*p).set_hop_size(hop);
            0
        }
        None => -1,
    }
}

/// `lfo` may be null, in which case the LFO is held at zero
#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_f32_process(
    p: *mut StereoSpectral<f32>,
    samples: u32,
    left: *const f32,
    right: *const f32,
    params: *const SpecfxNotchParams,
    lfo: *const f32,
    out_left: *mut f32,
    out_right: *mut f32,
) -> i32 {
    if p.is_null()
        || left.is_null()
        || right.is_null()
        || params.is_null()
        || out_left.is_null()
        || out_right.is_null()
    {
        return -1;
    }
    let len = samples as usize;
    let l = core::slice::from_raw_parts(left, len);
    let r = core::slice::from_raw_parts(right, len);
    let ol = core::slice::from_raw_parts_mut(out_left, len);
    let or = core::slice::from_raw_parts_mut(out_right, len);
    let lfo = if lfo.is_null() {
        None
    } else {
        Some(core::slice::from_raw_parts(lfo, len))
    };
    let notch = NotchParams::from(&*params);
    let hop = (*p).hop_size();
    for i in 0..len {
        let lfo = lfo.map_or(0.0, |x| x[i]);
        (ol[i], or[i]) = (*p).process_sample(l[i], r[i], &notch, lfo, hop);
    }
    samples as i32
}

#[no_mangle]
pub extern "C" fn specfx_stereo_engine_f32_new() -> *mut StereoEngine<f32> {
    Box::into_raw(Box::new(StereoEngine::new()))
}

#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_engine_f32_free(p: *mut StereoEngine<f32>) {
    if !p.is_null() {
        let _ = Box::from_raw(p);
    }
}

#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_engine_f32_init(
    p: *mut StereoEngine<f32>,
    sample_rate: f32,
) -> i32 {
    if p.is_null() || !(sample_rate > 0.0) {
        return -1;
    }
    (*p).init(Context::new(sample_rate));
    0
}

/// The LFO runs inside the engine; `settings.lfo_wave` must name a valid
/// waveform
#[no_mangle]
pub unsafe extern "C" fn specfx_stereo_engine_f32_process(
    p: *mut StereoEngine<f32>,
    samples: u32,
    left: *const f32,
    right: *const f32,
    settings: *const SpecfxStereoEngineSettings,
    out_left: *mut f32,
    out_right: *mut f32,
) -> i32 {
    if p.is_null()
        || left.is_null()
        || right.is_null()
        || settings.is_null()
        || out_left.is_null()
        || out_right.is_null()
    {
        return -1;
    }
    let settings = match StereoEngineSettings::try_from(&*settings) {
        Ok(x) => x,
        Err(_) => return -1,
    };
    let len = samples as usize;
    let l = core::slice::from_raw_parts(left, len);
    let r = core::slice::from_raw_parts(right, len);
    let ol = core::slice::from_raw_parts_mut(out_left, len);
    let or = core::slice::from_raw_parts_mut(out_right, len);
    (*p).process_block(&settings, [l, r], [ol, or]);
    samples as i32
}
