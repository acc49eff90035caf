//! Integration tests for dxcompiler
//!
//! Tests that talk to the native compiler need the `dxcwrapper` shim; point
//! `DXCRS_LIBRARY` at it. Without it they return early.

use dxcompiler::*;
use std::ffi::{CString, c_char};
use std::ptr;

fn load_library() -> Option<DxcLibrary> {
    let path = std::env::var_os("DXCRS_LIBRARY")?;
    Some(DxcLibrary::load(path).expect("DXCRS_LIBRARY points at a loadable shim"))
}

/// Helper to copy and release an output buffer
unsafe fn take_buffer(api: &DxcApi, buffer: &mut WritableDxcBuffer) -> Vec<u8> {
    let data = if buffer.Ptr.is_null() {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(buffer.Ptr as *const u8, buffer.Size).to_vec() }
    };
    unsafe { (api.free_buffer)(buffer) };
    data
}

const PIXEL_SHADER: &str = "
float4 main(float4 pos : SV_POSITION) : SV_TARGET {
    return pos;
}
";

const BROKEN_SHADER: &str = "
float4 main() : SV_TARGET {
    return undefined_variable;
}
";

unsafe fn compile(api: &DxcApi, source: &str, args: &[&str]) -> *mut IDxcResult {
    let compiler = unsafe { (api.create_compiler_instance)() };
    assert!(!compiler.is_null());

    let args: Vec<CString> = args.iter().map(|a| CString::new(*a).unwrap()).collect();
    let arg_ptrs: Vec<*const c_char> = args.iter().map(|a| a.as_ptr()).collect();

    let buffer = DxcBuffer {
        Ptr: source.as_ptr() as *const _,
        Size: source.len(),
        Encoding: DXC_CP_UTF8,
    };

    let mut result: *mut IDxcResult = ptr::null_mut();
    let hr = unsafe {
        (api.compile)(
            compiler,
            buffer,
            arg_ptrs.as_ptr(),
            arg_ptrs.len() as UINT,
            ptr::null_mut(),
            &mut result,
        )
    };
    assert_eq!(hr, S_OK);

    unsafe { (api.delete_compiler_instance)(compiler) };
    result
}

#[test]
fn test_load_missing_library() {
    let result = DxcLibrary::load("/nonexistent/libdxcwrapper.so");
    assert!(matches!(result, Err(DxcCompilerError::LoadError(_))));
}

#[test]
fn test_compile_pixel_shader() {
    let Some(library) = load_library() else {
        return;
    };
    let api = library.api();

    unsafe {
        let result = compile(api, PIXEL_SHADER, &["-E", "main", "-T", "ps_6_0"]);
        assert!(!result.is_null());
        assert_eq!((api.get_status)(result), S_OK);

        let mut output = WritableDxcBuffer::empty();
        let mut name = WritableDxcBuffer::empty();
        let hr = (api.get_result_output)(result, DXC_OUT_OBJECT, &mut output, &mut name);
        assert_eq!(hr, S_OK);

        let object = take_buffer(api, &mut output);
        take_buffer(api, &mut name);
        assert_eq!(&object[0..4], b"DXBC", "Object should be a DXIL container");

        (api.free_result)(result);
    }
}

#[test]
fn test_compile_error_status() {
    let Some(library) = load_library() else {
        return;
    };
    let api = library.api();

    unsafe {
        let result = compile(api, BROKEN_SHADER, &["-E", "main", "-T", "ps_6_0"]);
        assert!(!result.is_null());
        assert!((api.get_status)(result) < 0, "Status should be a failure");

        let mut output = WritableDxcBuffer::empty();
        let mut name = WritableDxcBuffer::empty();
        let hr = (api.get_result_output)(result, DXC_OUT_ERRORS, &mut output, &mut name);
        assert_eq!(hr, S_OK);

        let errors = String::from_utf8_lossy(&take_buffer(api, &mut output)).into_owned();
        take_buffer(api, &mut name);
        assert!(
            errors.contains("undefined_variable") || errors.contains("undeclared"),
            "Errors should mention the bad identifier: {}",
            errors
        );

        (api.free_result)(result);
    }
}

#[test]
fn test_missing_output_kind() {
    let Some(library) = load_library() else {
        return;
    };
    let api = library.api();

    unsafe {
        let result = compile(api, PIXEL_SHADER, &["-E", "main", "-T", "ps_6_0"]);

        let mut output = WritableDxcBuffer::empty();
        let mut name = WritableDxcBuffer::empty();
        let hr = (api.get_result_output)(result, DXC_OUT_TIME_TRACE, &mut output, &mut name);
        assert!(hr < 0, "No time trace was requested");
        assert!(output.Ptr.is_null());

        (api.free_result)(result);
    }
}
