//! FFI bindings for Exam Insight
//!
//! This module provides C-compatible functions for calling Insight from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `insight_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::AnalyticsError;
use crate::pipeline::InsightProcessor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Negative exam ids select the whole course
fn exam_scope(exam_id: i64) -> Option<u64> {
    u64::try_from(exam_id).ok()
}

/// Hand a report to the caller, or record the error and return NULL
fn deliver(result: Result<String, AnalyticsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build the student report for a snapshot with the default configuration.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string (snapshot
///   document, record array or NDJSON stream).
/// - Returns a newly allocated string that must be freed with `insight_free_string`.
/// - Returns NULL on error; call `insight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insight_student_report(
    snapshot_json: *const c_char,
    student_id: u64,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(snapshot_json) else {
        set_last_error("Invalid snapshot string pointer");
        return ptr::null_mut();
    };

    deliver(InsightProcessor::new().student_report_from_json(&json_str, student_id))
}

/// Build the class report for a snapshot with the default configuration.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - `exam_id` below zero analyses the whole course.
/// - Returns a newly allocated string that must be freed with `insight_free_string`.
/// - Returns NULL on error; call `insight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insight_class_report(
    snapshot_json: *const c_char,
    exam_id: i64,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(snapshot_json) else {
        set_last_error("Invalid snapshot string pointer");
        return ptr::null_mut();
    };

    deliver(InsightProcessor::new().class_report_from_json(&json_str, exam_scope(exam_id)))
}

// ============================================================================
// Configured Processor API
// ============================================================================

/// Opaque handle to an InsightProcessor
pub struct InsightProcessorHandle {
    processor: InsightProcessor,
}

/// Create a processor from a JSON configuration.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration.
/// - Must be freed with `insight_processor_free`.
/// - Returns NULL on an invalid configuration; call `insight_last_error`.
#[no_mangle]
pub unsafe extern "C" fn insight_processor_new(
    config_json: *const c_char,
) -> *mut InsightProcessorHandle {
    clear_last_error();

    let mut processor = InsightProcessor::new();
    if !config_json.is_null() {
        let Some(config) = cstr_to_string(config_json) else {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        };
        if let Err(e) = processor.load_config(&config) {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    }

    Box::into_raw(Box::new(InsightProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insight_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insight_processor_free(processor: *mut InsightProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Student report with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insight_processor_new`.
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `insight_free_string`.
#[no_mangle]
pub unsafe extern "C" fn insight_processor_student_report(
    processor: *const InsightProcessorHandle,
    snapshot_json: *const c_char,
    student_id: u64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(json_str) = cstr_to_string(snapshot_json) else {
        set_last_error("Invalid snapshot string pointer");
        return ptr::null_mut();
    };

    deliver(handle.processor.student_report_from_json(&json_str, student_id))
}

/// Class report with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insight_processor_new`.
/// - `snapshot_json` must be a valid null-terminated C string.
/// - `exam_id` below zero analyses the whole course.
/// - Returns a newly allocated string that must be freed with `insight_free_string`.
#[no_mangle]
pub unsafe extern "C" fn insight_processor_class_report(
    processor: *const InsightProcessorHandle,
    snapshot_json: *const c_char,
    exam_id: i64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(json_str) = cstr_to_string(snapshot_json) else {
        set_last_error("Invalid snapshot string pointer");
        return ptr::null_mut();
    };

    deliver(
        handle
            .processor
            .class_report_from_json(&json_str, exam_scope(exam_id)),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Insight functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Insight function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insight_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Insight function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn insight_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Insight library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn insight_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
