//! Message kind identifiers.
//!
//! `CM_*` kinds travel client → server, `SM_*` kinds server → client.

/// Query the character roster. Payload `username/token`.
pub const CM_QUERYCHR: u16 = 100;
/// Create a character. Payload `username/name/hair/job/sex/`.
pub const CM_NEWCHR: u16 = 101;
/// Pick a game server. Payload `server-name`.
pub const CM_SELECTSERVER: u16 = 104;
/// Submit credentials. Payload `username/password`.
pub const CM_IDPASSWORD: u16 = 2001;

pub const SM_PASSWD_FAIL: u16 = 503;
pub const SM_QUERYCHR: u16 = 520;
pub const SM_NEWCHR_SUCCESS: u16 = 521;
pub const SM_NEWCHR_FAIL: u16 = 522;
pub const SM_QUERYCHR_FAIL: u16 = 527;
pub const SM_PASSOK_SELECTSERVER: u16 = 529;
pub const SM_SELECTSERVER_OK: u16 = 530;
pub const SM_SELECTSERVER_FAIL: u16 = 531;

/// Human-readable name of a kind, for logs.
pub fn name(kind: u16) -> &'static str {
    match kind {
        CM_QUERYCHR => "CM_QUERYCHR",
        CM_NEWCHR => "CM_NEWCHR",
        CM_SELECTSERVER => "CM_SELECTSERVER",
        CM_IDPASSWORD => "CM_IDPASSWORD",
        SM_PASSWD_FAIL => "SM_PASSWD_FAIL",
        SM_QUERYCHR => "SM_QUERYCHR",
        SM_NEWCHR_SUCCESS => "SM_NEWCHR_SUCCESS",
        SM_NEWCHR_FAIL => "SM_NEWCHR_FAIL",
        SM_QUERYCHR_FAIL => "SM_QUERYCHR_FAIL",
        SM_PASSOK_SELECTSERVER => "SM_PASSOK_SELECTSERVER",
        SM_SELECTSERVER_OK => "SM_SELECTSERVER_OK",
        SM_SELECTSERVER_FAIL => "SM_SELECTSERVER_FAIL",
        _ => "UNKNOWN",
    }
}
