//! Crash reporting and user-facing error dialogs.

#[cfg(target_os = "windows")]
mod imp {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tracing::error;
    use windows::Win32::System::Diagnostics::Debug::{
        EXCEPTION_POINTERS, SetUnhandledExceptionFilter,
    };
    use windows::Win32::UI::WindowsAndMessaging::{MB_ICONERROR, MB_OK, MessageBoxA};
    use windows::core::s;

    /// Let the default handler terminate the process
    const EXCEPTION_CONTINUE_SEARCH: i32 = 0;

    static HAD_EXCEPTION: AtomicBool = AtomicBool::new(false);

    unsafe extern "system" fn exception_handler(ep: *const EXCEPTION_POINTERS) -> i32 {
        // SAFETY: removing our own filter; the previous one is not restored.
        unsafe {
            SetUnhandledExceptionFilter(None);
        }

        if HAD_EXCEPTION.swap(true, Ordering::SeqCst) {
            error!("Crash while running the exception handler");
            return EXCEPTION_CONTINUE_SEARCH;
        }

        // SAFETY: the system passes valid exception pointers to the filter.
        let record = unsafe { ep.as_ref().and_then(|ep| ep.ExceptionRecord.as_ref()) };
        match record {
            Some(record) => error!(
                "Exception 0x{:x}, address {:p}",
                record.ExceptionCode.0, record.ExceptionAddress
            ),
            None => error!("Unhandled exception without a record"),
        }
        EXCEPTION_CONTINUE_SEARCH
    }

    pub fn install_crash_handler() {
        // SAFETY: the handler only logs and never touches launcher state.
        unsafe {
            SetUnhandledExceptionFilter(Some(exception_handler));
        }
    }

    pub fn report_launch_failure() {
        // SAFETY: static NUL-terminated strings, no owner window.
        unsafe {
            _ = MessageBoxA(
                None,
                s!("Something went wrong while launching the game."),
                s!("Error"),
                MB_ICONERROR | MB_OK,
            );
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    pub fn install_crash_handler() {}

    pub fn report_launch_failure() {}
}

pub use imp::{install_crash_handler, report_launch_failure};
