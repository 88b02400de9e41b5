//! C ABI
//!
//! Handles are boxed Rust values passed as opaque pointers. Strings returned
//! to C are allocated here and must be released with [`locale_free_str`].
//! Every entry point checks its pointers before use, never lets a panic
//! unwind into C, and records failures in a thread-local last error that
//! [`anlocales_last_error`] and [`anlocales_last_error_message`] expose.

use crate::error::LocaleError;
use crate::locale::Locale;
use crate::manager::LocaleManager;
use crate::plural::PluralCategory;
use log::error;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int, c_uint};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

pub const ANLOCALES_OK: c_int = 0;
pub const ANLOCALES_ERR_NULL_POINTER: c_int = 1;
pub const ANLOCALES_ERR_INVALID_UTF8: c_int = 2;
pub const ANLOCALES_ERR_INVALID_LOCALE_ID: c_int = 3;
pub const ANLOCALES_ERR_NOT_FOUND: c_int = 4;
pub const ANLOCALES_ERR_LOAD: c_int = 5;
pub const ANLOCALES_ERR_INVALID_DATE: c_int = 6;
pub const ANLOCALES_ERR_INVALID_NUMBER: c_int = 7;
pub const ANLOCALES_ERR_INTERIOR_NUL: c_int = 8;
pub const ANLOCALES_ERR_PANIC: c_int = 9;

/// Opaque manager handle as seen from C
pub type AnLocales = LocaleManager;

thread_local! {
    static LAST_ERROR: RefCell<Option<FfiError>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone)]
struct FfiError {
    code: c_int,
    message: String,
}

impl FfiError {
    fn new(code: c_int, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn null(what: &str) -> Self {
        Self::new(ANLOCALES_ERR_NULL_POINTER, format!("{what} is null"))
    }
}

impl From<LocaleError> for FfiError {
    fn from(err: LocaleError) -> Self {
        let code = match &err {
            LocaleError::NotFound { .. } => ANLOCALES_ERR_NOT_FOUND,
            LocaleError::Load { .. } | LocaleError::TaskFailed { .. } => ANLOCALES_ERR_LOAD,
            LocaleError::InvalidLocaleId(_) => ANLOCALES_ERR_INVALID_LOCALE_ID,
            LocaleError::InvalidDate { .. } => ANLOCALES_ERR_INVALID_DATE,
            LocaleError::InvalidNumber(_) => ANLOCALES_ERR_INVALID_NUMBER,
        };
        Self::new(code, err.detailed_message())
    }
}

fn set_last_error(err: Option<FfiError>) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = err);
}

/// Run `body` with the last error reset, mapping failures and panics to `failure`
fn guard<T>(name: &str, failure: T, body: impl FnOnce() -> Result<T, FfiError>) -> T {
    set_last_error(None);
    let err = match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => return value,
        Ok(Err(err)) => err,
        Err(_) => {
            error!("Panic in {}", name);
            FfiError::new(ANLOCALES_ERR_PANIC, format!("panic in {name}"))
        }
    };
    if err.code == ANLOCALES_ERR_NULL_POINTER || err.code == ANLOCALES_ERR_PANIC {
        error!("{}: {}", name, err.message);
    }
    set_last_error(Some(err));
    failure
}

unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::null(what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| FfiError::new(ANLOCALES_ERR_INVALID_UTF8, format!("{what} is not UTF-8")))
}

unsafe fn ref_arg<'a, T>(ptr: *const T, what: &str) -> Result<&'a T, FfiError> {
    ptr.as_ref().ok_or_else(|| FfiError::null(what))
}

fn c_string(s: impl Into<Vec<u8>>) -> Result<*mut c_char, FfiError> {
    CString::new(s)
        .map(CString::into_raw)
        .map_err(|_| FfiError::new(ANLOCALES_ERR_INTERIOR_NUL, "result contains a NUL byte"))
}

fn boxed_locale(locale: Locale) -> *mut Locale {
    Box::into_raw(Box::new(locale))
}

// ── Manager ─────────────────────────────────────────────────────────

/// Create a manager over the platform directories
#[no_mangle]
pub extern "C" fn anlocales_new() -> *mut AnLocales {
    guard("anlocales_new", ptr::null_mut(), || {
        Ok(Box::into_raw(Box::new(LocaleManager::new())))
    })
}

/// Create a manager over explicit directories
///
/// # Safety
/// Each argument must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn anlocales_new_with_paths(
    locales_path: *const c_char,
    temp_path: *const c_char,
    settings_file_path: *const c_char,
) -> *mut AnLocales {
    guard("anlocales_new_with_paths", ptr::null_mut(), || {
        let locales = str_arg(locales_path, "locales_path")?;
        let temp = str_arg(temp_path, "temp_path")?;
        let settings = str_arg(settings_file_path, "settings_file_path")?;
        let manager = LocaleManager::with_paths(locales, temp, settings);
        Ok(Box::into_raw(Box::new(manager)))
    })
}

/// # Safety
/// `ptr` must be null or a pointer returned by `anlocales_new*` that has not
/// been freed.
#[no_mangle]
pub unsafe extern "C" fn anlocales_free(ptr: *mut AnLocales) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// Load a locale by name; null on failure
///
/// # Safety
/// `al` must be null or a live manager; `name` null or a C string.
#[no_mangle]
pub unsafe extern "C" fn locale_load(al: *const AnLocales, name: *const c_char) -> *mut Locale {
    guard("locale_load", ptr::null_mut(), || {
        let manager = ref_arg(al, "manager")?;
        let name = str_arg(name, "name")?;
        Ok(boxed_locale(manager.load(name)?))
    })
}

/// # Safety
/// `al` must be null or a live manager.
#[no_mangle]
pub unsafe extern "C" fn anlocales_default_locale(al: *const AnLocales) -> *mut Locale {
    guard("anlocales_default_locale", ptr::null_mut(), || {
        let manager = ref_arg(al, "manager")?;
        Ok(boxed_locale(manager.default_locale()))
    })
}

/// # Safety
/// `al` must be null or a live manager.
#[no_mangle]
pub unsafe extern "C" fn anlocales_fallback_locale(al: *const AnLocales) -> *mut Locale {
    guard("anlocales_fallback_locale", ptr::null_mut(), || {
        let manager = ref_arg(al, "manager")?;
        Ok(boxed_locale(manager.fallback_locale()))
    })
}

/// # Safety
/// `loc` must be null or a locale returned by this library, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn locale_free(loc: *mut Locale) {
    if !loc.is_null() {
        drop(Box::from_raw(loc));
    }
}

// ── Locale queries ──────────────────────────────────────────────────

/// Translation of `key`, or a copy of `key` when missing
///
/// # Safety
/// `loc` must be null or a live locale; `key` null or a C string.
#[no_mangle]
pub unsafe extern "C" fn locale_t(loc: *const Locale, key: *const c_char) -> *mut c_char {
    guard("locale_t", ptr::null_mut(), || {
        let locale = ref_arg(loc, "locale")?;
        let key = str_arg(key, "key")?;
        c_string(locale.translate(key))
    })
}

/// # Safety
/// `loc` must be null or a live locale.
#[no_mangle]
pub unsafe extern "C" fn locale_name(loc: *const Locale) -> *mut c_char {
    guard("locale_name", ptr::null_mut(), || {
        c_string(ref_arg(loc, "locale")?.name())
    })
}

/// # Safety
/// `loc` must be null or a live locale.
#[no_mangle]
pub unsafe extern "C" fn locale_format_date(
    loc: *const Locale,
    year: c_int,
    month: c_uint,
    day: c_uint,
) -> *mut c_char {
    guard("locale_format_date", ptr::null_mut(), || {
        let locale = ref_arg(loc, "locale")?;
        c_string(locale.format_date(year, month, day)?)
    })
}

/// # Safety
/// `loc` must be null or a live locale.
#[no_mangle]
pub unsafe extern "C" fn locale_format_money(loc: *const Locale, amount: c_double) -> *mut c_char {
    guard("locale_format_money", ptr::null_mut(), || {
        c_string(ref_arg(loc, "locale")?.format_money(amount))
    })
}

/// Money from a decimal string such as `"1234.505"`
///
/// # Safety
/// `loc` must be null or a live locale; `amount` null or a C string.
#[no_mangle]
pub unsafe extern "C" fn locale_format_money_str(
    loc: *const Locale,
    amount: *const c_char,
) -> *mut c_char {
    guard("locale_format_money_str", ptr::null_mut(), || {
        let locale = ref_arg(loc, "locale")?;
        let amount = str_arg(amount, "amount")?;
        c_string(locale.format_money_decimal(amount)?)
    })
}

/// # Safety
/// `loc` must be null or a live locale.
#[no_mangle]
pub unsafe extern "C" fn locale_format_numeric(
    loc: *const Locale,
    number: c_double,
) -> *mut c_char {
    guard("locale_format_numeric", ptr::null_mut(), || {
        c_string(ref_arg(loc, "locale")?.format_numeric(number))
    })
}

/// # Safety
/// `loc` must be null or a live locale; `number` null or a C string.
#[no_mangle]
pub unsafe extern "C" fn locale_format_numeric_str(
    loc: *const Locale,
    number: *const c_char,
) -> *mut c_char {
    guard("locale_format_numeric_str", ptr::null_mut(), || {
        let locale = ref_arg(loc, "locale")?;
        let number = str_arg(number, "number")?;
        c_string(locale.format_numeric_decimal(number)?)
    })
}

/// -1, 0 or 1 under the locale's collation; 0 on error
///
/// # Safety
/// `loc` must be null or a live locale; `a` and `b` null or C strings.
#[no_mangle]
pub unsafe extern "C" fn locale_compare(
    loc: *const Locale,
    a: *const c_char,
    b: *const c_char,
) -> c_int {
    guard("locale_compare", 0, || {
        let locale = ref_arg(loc, "locale")?;
        let a = str_arg(a, "a")?;
        let b = str_arg(b, "b")?;
        Ok(match locale.compare(a, b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        })
    })
}

/// Form of `key` for `n`, or a copy of `key` when missing
///
/// # Safety
/// `loc` must be null or a live locale; `key` null or a C string.
#[no_mangle]
pub unsafe extern "C" fn locale_plural_word(
    loc: *const Locale,
    key: *const c_char,
    n: u32,
) -> *mut c_char {
    guard("locale_plural_word", ptr::null_mut(), || {
        let locale = ref_arg(loc, "locale")?;
        let key = str_arg(key, "key")?;
        c_string(locale.plural_word(key, n))
    })
}

/// Plural category of `n`: 0 zero, 1 one, 2 two, 3 few, 4 many, 5 other;
/// -1 on error
///
/// # Safety
/// `loc` must be null or a live locale.
#[no_mangle]
pub unsafe extern "C" fn locale_plural_category(loc: *const Locale, n: u32) -> c_int {
    guard("locale_plural_category", -1, || {
        let category = ref_arg(loc, "locale")?.plural_category(n);
        Ok(match category {
            PluralCategory::Zero => 0,
            PluralCategory::One => 1,
            PluralCategory::Two => 2,
            PluralCategory::Few => 3,
            PluralCategory::Many => 4,
            PluralCategory::Other => 5,
        })
    })
}

/// `true` unless `n` is in the `one` category; `false` on error
///
/// # Safety
/// `loc` must be null or a live locale.
#[no_mangle]
pub unsafe extern "C" fn locale_plural(loc: *const Locale, n: u32) -> bool {
    guard("locale_plural", false, || {
        Ok(ref_arg(loc, "locale")?.plural(n))
    })
}

/// # Safety
/// `s` must be null or a string returned by this library, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn locale_free_str(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ── Diagnostics ─────────────────────────────────────────────────────

/// Code of the last failure on this thread, `ANLOCALES_OK` if the last call succeeded
#[no_mangle]
pub extern "C" fn anlocales_last_error() -> c_int {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ANLOCALES_OK, |err| err.code)
    })
}

/// Message of the last failure on this thread, null if none; free with
/// `locale_free_str`
#[no_mangle]
pub extern "C" fn anlocales_last_error_message() -> *mut c_char {
    let message = LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|err| err.message.clone()));
    match message {
        Some(message) => CString::new(message.replace('\0', " "))
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
        None => ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "C" fn anlocales_init_logging() {
    crate::init_logging();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{write_locale, EN_FORMAT};
    use tempfile::TempDir;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        locale_free_str(ptr);
        s
    }

    fn manager(temp: &TempDir) -> *mut AnLocales {
        let data = temp.path().join("locales");
        write_locale(
            &data,
            "en-US",
            EN_FORMAT,
            Some(r#"{ "hello": "Hello", "files": { "one": "file", "other": "files" } }"#),
        );
        let locales = cstr(data.to_str().unwrap());
        let tmp = cstr(temp.path().join("tmp").to_str().unwrap());
        let settings = cstr(temp.path().join("settings.json").to_str().unwrap());
        let al = unsafe { anlocales_new_with_paths(locales.as_ptr(), tmp.as_ptr(), settings.as_ptr()) };
        assert!(!al.is_null());
        al
    }

    #[test]
    fn test_round_trip_through_c_api() {
        let temp = TempDir::new().unwrap();
        let al = manager(&temp);
        unsafe {
            let name = cstr("en_US");
            let loc = locale_load(al, name.as_ptr());
            assert!(!loc.is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_OK);

            assert_eq!(take(locale_name(loc)), "en-US");
            assert_eq!(take(locale_t(loc, cstr("hello").as_ptr())), "Hello");
            assert_eq!(take(locale_t(loc, cstr("nope").as_ptr())), "nope");
            assert_eq!(take(locale_format_money(loc, 1234.5)), "$1,234.50");
            assert_eq!(take(locale_format_money_str(loc, cstr("-0.005").as_ptr())), "-$0.01");
            assert_eq!(take(locale_format_numeric(loc, 1234567.25)), "1,234,567.25");
            assert_eq!(take(locale_format_numeric_str(loc, cstr("1e3").as_ptr())), "1,000");
            assert_eq!(take(locale_format_date(loc, 2024, 2, 29)), "February 29, 2024");
            assert_eq!(take(locale_plural_word(loc, cstr("files").as_ptr(), 1)), "file");
            assert_eq!(take(locale_plural_word(loc, cstr("files").as_ptr(), 7)), "files");
            assert_eq!(locale_plural_category(loc, 1), 1);
            assert!(locale_plural(loc, 2));
            assert!(!locale_plural(loc, 1));
            assert_eq!(locale_compare(loc, cstr("a").as_ptr(), cstr("b").as_ptr()), -1);
            assert_eq!(locale_compare(loc, cstr("b").as_ptr(), cstr("a").as_ptr()), 1);
            assert_eq!(locale_compare(loc, cstr("a").as_ptr(), cstr("a").as_ptr()), 0);

            locale_free(loc);
            anlocales_free(al);
        }
    }

    #[test]
    fn test_null_arguments_report_errors() {
        unsafe {
            assert!(locale_load(ptr::null(), cstr("en").as_ptr()).is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_ERR_NULL_POINTER);
            assert!(!anlocales_last_error_message().is_null());

            assert!(locale_t(ptr::null(), ptr::null()).is_null());
            assert_eq!(locale_compare(ptr::null(), ptr::null(), ptr::null()), 0);
            assert_eq!(anlocales_last_error(), ANLOCALES_ERR_NULL_POINTER);
            assert!(!locale_plural(ptr::null(), 1));
            assert_eq!(locale_plural_category(ptr::null(), 1), -1);
            assert!(anlocales_default_locale(ptr::null()).is_null());
            assert!(anlocales_new_with_paths(ptr::null(), ptr::null(), ptr::null()).is_null());

            locale_free(ptr::null_mut());
            anlocales_free(ptr::null_mut());
            locale_free_str(ptr::null_mut());
        }
    }

    #[test]
    fn test_failures_set_codes_and_success_resets() {
        let temp = TempDir::new().unwrap();
        let al = manager(&temp);
        unsafe {
            assert!(locale_load(al, cstr("fr").as_ptr()).is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_ERR_NOT_FOUND);
            let message = take(anlocales_last_error_message());
            assert!(message.contains("fr"));

            assert!(locale_load(al, cstr("!!").as_ptr()).is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_ERR_INVALID_LOCALE_ID);

            let loc = anlocales_fallback_locale(al);
            assert!(!loc.is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_OK);
            assert!(anlocales_last_error_message().is_null());

            assert!(locale_format_date(loc, 2023, 2, 29).is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_ERR_INVALID_DATE);
            assert!(locale_format_numeric_str(loc, cstr("abc").as_ptr()).is_null());
            assert_eq!(anlocales_last_error(), ANLOCALES_ERR_INVALID_NUMBER);

            let default = anlocales_default_locale(al);
            assert!(!default.is_null());

            locale_free(default);
            locale_free(loc);
            anlocales_free(al);
        }
    }

    #[test]
    fn test_locale_outlives_manager() {
        let temp = TempDir::new().unwrap();
        let al = manager(&temp);
        unsafe {
            let loc = locale_load(al, cstr("en-US").as_ptr());
            anlocales_free(al);
            assert_eq!(take(locale_t(loc, cstr("hello").as_ptr())), "Hello");
            locale_free(loc);
        }
    }
}
