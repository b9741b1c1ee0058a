//! C ABI surface
//!
//! A flat `extern "C"` layer over the factory, processor, and file I/O so
//! other languages can drive the library through a handle-based API. All
//! functions are null-safe and never unwind across the boundary: failures
//! surface as null returns or zero/negative status codes, and details go to
//! the log.
//!
//! Ownership rules:
//! - `stompbox_create_processor` / `stompbox_load_plugin` return handles
//!   that must be released with `stompbox_processor_free`.
//! - `stompbox_load_audio_file` returns a buffer that must be released with
//!   `stompbox_audio_buffer_free`; the `data` pointers inside it belong to
//!   the buffer and must not be freed individually.

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_float, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::ptr;

use log::{error, warn};

use crate::engine::{self, AudioBuffer, Block};
use crate::factory;
use crate::host;
use crate::processor::Processor;

/// C view of deinterleaved audio
///
/// `data` points to `num_channels` channel pointers, each holding
/// `num_samples` floats.
#[repr(C)]
pub struct StompboxAudioBuffer {
    pub data: *mut *mut c_float,
    pub num_channels: c_int,
    pub num_samples: c_int,
    pub sample_rate: c_double,
}

/// Initialize the library
///
/// Idempotent; call once before any other function. Subsequent calls are
/// no-ops.
#[no_mangle]
pub extern "C" fn stompbox_init() {
    host::init();
}

unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Create a built-in effect processor by name
///
/// Returns null for unknown names or a null/invalid `name` pointer.
///
/// # Safety
/// `name` must be null or point to a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn stompbox_create_processor(name: *const c_char) -> *mut Processor {
    let Some(name) = cstr_to_str(name) else {
        return ptr::null_mut();
    };
    match factory::create_builtin_processor(name) {
        Some(processor) => Box::into_raw(Box::new(processor)),
        None => ptr::null_mut(),
    }
}

/// Load the first effect from a plugin file
///
/// Returns null on any failure (missing file, no matching format, load
/// error); the reason is logged.
///
/// # Safety
/// `path` must be null or point to a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn stompbox_load_plugin(path: *const c_char) -> *mut Processor {
    let Some(path) = cstr_to_str(path) else {
        return ptr::null_mut();
    };
    match factory::load_plugin_processor(Path::new(path)) {
        Ok(processor) => Box::into_raw(Box::new(processor)),
        Err(err) => {
            error!("plugin load failed: {}", err);
            ptr::null_mut()
        }
    }
}

/// Release a processor handle
///
/// Accepts null.
///
/// # Safety
/// `processor` must be null or a handle returned by this library that has
/// not been freed.
#[no_mangle]
pub unsafe extern "C" fn stompbox_processor_free(processor: *mut Processor) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Number of parameters the processor exposes
///
/// Returns 0 for a null handle.
///
/// # Safety
/// `processor` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn stompbox_num_parameters(processor: *const Processor) -> c_int {
    match processor.as_ref() {
        Some(proc) => proc.num_params() as c_int,
        None => 0,
    }
}

/// Set a parameter from its normalized [0, 1] value
///
/// Out-of-range indices and null handles are silently ignored. Safe to
/// call from a control thread while another thread is inside
/// `stompbox_process`; the value is applied at the start of the next
/// block.
///
/// # Safety
/// `processor` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn stompbox_set_parameter(
    processor: *const Processor,
    index: c_int,
    value: c_float,
) {
    let Some(proc) = processor.as_ref() else {
        return;
    };
    if index < 0 {
        return;
    }
    proc.set_param(index as usize, value);
}

/// Get a parameter's normalized value
///
/// Returns 0.0 for null handles and out-of-range indices.
///
/// # Safety
/// `processor` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn stompbox_get_parameter(
    processor: *const Processor,
    index: c_int,
) -> c_float {
    let Some(proc) = processor.as_ref() else {
        return 0.0;
    };
    if index < 0 {
        return 0.0;
    }
    proc.get_param(index as usize)
}

/// Process audio in place
///
/// `data` points to `num_channels` channel pointers of `num_samples` floats
/// each. A sample rate differing from the previous call re-prepares the
/// effect. Returns 1 on success, 0 on bad arguments.
///
/// # Safety
/// `processor` must be a live handle; `data` must describe valid, writable,
/// non-aliasing channel buffers of the stated dimensions.
#[no_mangle]
pub unsafe extern "C" fn stompbox_process(
    processor: *mut Processor,
    data: *mut *mut c_float,
    num_channels: c_int,
    num_samples: c_int,
    sample_rate: c_double,
) -> c_int {
    let Some(proc) = processor.as_mut() else {
        return 0;
    };
    if data.is_null() || num_channels < 0 || num_samples < 0 || sample_rate <= 0.0 {
        return 0;
    }

    let channels: Vec<&mut [f32]> = (0..num_channels as usize)
        .filter_map(|ch| {
            let ptr = *data.add(ch);
            if ptr.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts_mut(ptr, num_samples as usize))
            }
        })
        .collect();
    if channels.len() != num_channels as usize {
        return 0;
    }

    let mut block = Block::new(channels);
    let result = catch_unwind(AssertUnwindSafe(|| {
        proc.process(&mut block, sample_rate);
    }));
    match result {
        Ok(()) => 1,
        Err(_) => {
            error!("processing panicked; block left unmodified past the fault");
            0
        }
    }
}

// ============================================================================
// Audio File I/O
// ============================================================================

fn buffer_to_c(buffer: AudioBuffer) -> *mut StompboxAudioBuffer {
    let num_channels = buffer.num_channels();
    let num_samples = buffer.num_samples();
    let sample_rate = buffer.sample_rate;

    // Each channel becomes a leaked boxed slice; the outer pointer table is
    // another. stompbox_audio_buffer_free reclaims all of them.
    let mut pointers: Vec<*mut c_float> = Vec::with_capacity(num_channels);
    for channel in buffer.samples {
        let boxed: Box<[f32]> = channel.into_boxed_slice();
        pointers.push(Box::into_raw(boxed) as *mut c_float);
    }
    let data = Box::into_raw(pointers.into_boxed_slice()) as *mut *mut c_float;

    Box::into_raw(Box::new(StompboxAudioBuffer {
        data,
        num_channels: num_channels as c_int,
        num_samples: num_samples as c_int,
        sample_rate,
    }))
}

/// Load an audio file into a new buffer
///
/// Returns null on failure; the reason is logged. Free the result with
/// `stompbox_audio_buffer_free`.
///
/// # Safety
/// `path` must be null or point to a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn stompbox_load_audio_file(
    path: *const c_char,
) -> *mut StompboxAudioBuffer {
    let Some(path) = cstr_to_str(path) else {
        return ptr::null_mut();
    };
    match engine::load_audio_file(Path::new(path)) {
        Ok(buffer) => buffer_to_c(buffer),
        Err(err) => {
            error!("load failed for {}: {}", path, err);
            ptr::null_mut()
        }
    }
}

/// Save a buffer to an audio file
///
/// Writes 16-bit WAV, replacing any existing file. Returns 1 on success,
/// 0 on failure.
///
/// # Safety
/// `path` must point to a valid NUL-terminated string; `buffer` must be null
/// or a live buffer from this library.
#[no_mangle]
pub unsafe extern "C" fn stompbox_save_audio_file(
    path: *const c_char,
    buffer: *const StompboxAudioBuffer,
) -> c_int {
    let Some(path) = cstr_to_str(path) else {
        return 0;
    };
    let Some(buffer) = buffer.as_ref() else {
        return 0;
    };
    if buffer.data.is_null() || buffer.num_channels < 0 || buffer.num_samples < 0 {
        return 0;
    }

    let num_channels = buffer.num_channels as usize;
    let num_samples = buffer.num_samples as usize;
    let mut samples = Vec::with_capacity(num_channels);
    for ch in 0..num_channels {
        let ptr = *buffer.data.add(ch);
        if ptr.is_null() {
            warn!("save rejected: channel {} pointer is null", ch);
            return 0;
        }
        samples.push(std::slice::from_raw_parts(ptr, num_samples).to_vec());
    }

    let owned = AudioBuffer {
        samples,
        sample_rate: buffer.sample_rate,
    };
    match engine::save_audio_file(Path::new(path), &owned, engine::DEFAULT_BIT_DEPTH) {
        Ok(()) => 1,
        Err(err) => {
            error!("save failed for {}: {}", path, err);
            0
        }
    }
}

/// Release a buffer returned by `stompbox_load_audio_file`
///
/// Accepts null.
///
/// # Safety
/// `buffer` must be null or a buffer from this library that has not been
/// freed.
#[no_mangle]
pub unsafe extern "C" fn stompbox_audio_buffer_free(buffer: *mut StompboxAudioBuffer) {
    if buffer.is_null() {
        return;
    }
    let buffer = Box::from_raw(buffer);
    if buffer.data.is_null() {
        return;
    }
    let num_channels = buffer.num_channels.max(0) as usize;
    let num_samples = buffer.num_samples.max(0) as usize;
    let pointers = Box::from_raw(std::slice::from_raw_parts_mut(buffer.data, num_channels));
    for &ptr in pointers.iter() {
        if !ptr.is_null() {
            drop(Box::from_raw(std::slice::from_raw_parts_mut(
                ptr,
                num_samples,
            )));
        }
    }
}
