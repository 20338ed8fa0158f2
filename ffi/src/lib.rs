mod types;

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

pub use types::{FfiBounds, FfiPoint};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(err: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(err).ok();
    });
}

pub struct GlyphOutputHandle {
    output: glyph_points::OutlineOutput,
}

fn extract_bytes(bytes: &[u8], depth_limit: Option<u32>) -> *mut GlyphOutputHandle {
    let extractor = match depth_limit {
        Some(limit) => glyph_points::FontExtractor::builder()
            .composite_depth_limit(limit)
            .build(),
        None => glyph_points::FontExtractor::default(),
    };

    match extractor.from_bytes(bytes) {
        Ok(output) => {
            let handle = Box::new(GlyphOutputHandle { output });
            Box::into_raw(handle)
        }
        Err(e) => {
            set_last_error(format!("Failed to extract outlines: {}", e));
            ptr::null_mut()
        }
    }
}

fn extract_path(path: *const c_char, depth_limit: Option<u32>) -> *mut GlyphOutputHandle {
    if path.is_null() {
        set_last_error("Path pointer is null".to_string());
        return ptr::null_mut();
    }

    let path_str = unsafe {
        match CStr::from_ptr(path).to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(format!("Invalid UTF-8 in path: {}", e));
                return ptr::null_mut();
            }
        }
    };

    let bytes = match std::fs::read(path_str) {
        Ok(bytes) => bytes,
        Err(e) => {
            set_last_error(format!("Failed to read font file: {}", e));
            return ptr::null_mut();
        }
    };

    extract_bytes(&bytes, depth_limit)
}

#[no_mangle]
pub extern "C" fn glyph_extract_from_path(path: *const c_char) -> *mut GlyphOutputHandle {
    extract_path(path, None)
}

#[no_mangle]
pub extern "C" fn glyph_extract_from_path_with_depth_limit(
    path: *const c_char,
    depth_limit: u32,
) -> *mut GlyphOutputHandle {
    extract_path(path, Some(depth_limit))
}

#[no_mangle]
pub extern "C" fn glyph_extract_from_bytes(data: *const u8, len: usize) -> *mut GlyphOutputHandle {
    if data.is_null() {
        set_last_error("Data pointer is null".to_string());
        return ptr::null_mut();
    }

    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    extract_bytes(bytes, None)
}

#[no_mangle]
pub extern "C" fn glyph_extract_from_bytes_with_depth_limit(
    data: *const u8,
    len: usize,
    depth_limit: u32,
) -> *mut GlyphOutputHandle {
    if data.is_null() {
        set_last_error("Data pointer is null".to_string());
        return ptr::null_mut();
    }

    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    extract_bytes(bytes, Some(depth_limit))
}

#[no_mangle]
pub extern "C" fn glyph_count(handle: *const GlyphOutputHandle) -> usize {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return 0;
    }

    let handle = unsafe { &*handle };
    handle.output.glyphs().len()
}

#[no_mangle]
pub extern "C" fn glyph_contour_count(handle: *const GlyphOutputHandle, glyph_idx: usize) -> usize {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return 0;
    }

    let handle = unsafe { &*handle };

    match handle.output.glyphs().get(glyph_idx) {
        Some(glyph) => glyph.contours().len(),
        None => {
            set_last_error(format!("Glyph index {} out of bounds", glyph_idx));
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn glyph_contour_point_count(
    handle: *const GlyphOutputHandle,
    glyph_idx: usize,
    contour_idx: usize,
) -> usize {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return 0;
    }

    let handle = unsafe { &*handle };

    let glyph = match handle.output.glyphs().get(glyph_idx) {
        Some(glyph) => glyph,
        None => {
            set_last_error(format!("Glyph index {} out of bounds", glyph_idx));
            return 0;
        }
    };

    match glyph.contours().get(contour_idx) {
        Some(contour) => contour.len(),
        None => {
            set_last_error(format!("Contour index {} out of bounds", contour_idx));
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn glyph_get_point(
    handle: *const GlyphOutputHandle,
    glyph_idx: usize,
    contour_idx: usize,
    point_idx: usize,
    out: *mut FfiPoint,
) -> i32 {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return -1;
    }

    if out.is_null() {
        set_last_error("Output pointer is null".to_string());
        return -1;
    }

    let handle = unsafe { &*handle };

    let glyph = match handle.output.glyphs().get(glyph_idx) {
        Some(glyph) => glyph,
        None => {
            set_last_error(format!("Glyph index {} out of bounds", glyph_idx));
            return -1;
        }
    };

    let contour = match glyph.contours().get(contour_idx) {
        Some(contour) => contour,
        None => {
            set_last_error(format!("Contour index {} out of bounds", contour_idx));
            return -1;
        }
    };

    let point = match contour.get(point_idx) {
        Some(point) => point,
        None => {
            set_last_error(format!("Point index {} out of bounds", point_idx));
            return -1;
        }
    };

    unsafe {
        *out = FfiPoint::from(*point);
    }

    0
}

#[no_mangle]
pub extern "C" fn glyph_get_bounds(
    handle: *const GlyphOutputHandle,
    glyph_idx: usize,
    out: *mut FfiBounds,
) -> i32 {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return -1;
    }

    if out.is_null() {
        set_last_error("Output pointer is null".to_string());
        return -1;
    }

    let handle = unsafe { &*handle };

    let glyph = match handle.output.glyphs().get(glyph_idx) {
        Some(glyph) => glyph,
        None => {
            set_last_error(format!("Glyph index {} out of bounds", glyph_idx));
            return -1;
        }
    };

    unsafe {
        *out = FfiBounds::from(glyph.bounds());
    }

    0
}

#[no_mangle]
pub extern "C" fn glyph_output_to_string(handle: *const GlyphOutputHandle) -> *mut c_char {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return ptr::null_mut();
    }

    let handle = unsafe { &*handle };
    let text = handle.output.to_string();

    match CString::new(text) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            set_last_error(format!("Failed to convert output to C string: {}", e));
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn glyph_output_to_string_pretty(handle: *const GlyphOutputHandle) -> *mut c_char {
    if handle.is_null() {
        set_last_error("Handle is null".to_string());
        return ptr::null_mut();
    }

    let handle = unsafe { &*handle };
    let text = handle.output.to_string_pretty();

    match CString::new(text) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            set_last_error(format!("Failed to convert output to C string: {}", e));
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn glyph_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

#[no_mangle]
pub extern "C" fn glyph_output_free(handle: *mut GlyphOutputHandle) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

#[no_mangle]
pub extern "C" fn glyph_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(err) => err.as_ptr(),
        None => ptr::null(),
    })
}
