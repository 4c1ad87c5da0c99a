//! Numeric reply codes used by the daemon.
//!
//! Only the numerics the core and its command shell actually emit are
//! listed. Names follow RFC 2812 / modern.ircdocs.horse; the module-list and
//! module-load numerics follow InspIRCd's allocation.

#![allow(non_camel_case_types)]

/// IRC server numeric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// 001
    RPL_WELCOME = 1,
    /// 002
    RPL_YOURHOST = 2,
    /// 003
    RPL_CREATED = 3,
    /// 004
    RPL_MYINFO = 4,
    /// 005
    RPL_ISUPPORT = 5,
    /// 221 - current user modes
    RPL_UMODEIS = 221,
    /// 324 - current channel modes
    RPL_CHANNELMODEIS = 324,
    /// 329 - channel creation time
    RPL_CREATIONTIME = 329,
    /// 348 - ban exception list entry
    RPL_EXCEPTLIST = 348,
    /// 349
    RPL_ENDOFEXCEPTLIST = 349,
    /// 353
    RPL_NAMREPLY = 353,
    /// 366
    RPL_ENDOFNAMES = 366,
    /// 367 - ban list entry
    RPL_BANLIST = 367,
    /// 368
    RPL_ENDOFBANLIST = 368,
    /// 381
    RPL_YOUREOPER = 381,
    /// 401
    ERR_NOSUCHNICK = 401,
    /// 403
    ERR_NOSUCHCHANNEL = 403,
    /// 404
    ERR_CANNOTSENDTOCHAN = 404,
    /// 421
    ERR_UNKNOWNCOMMAND = 421,
    /// 431
    ERR_NONICKNAMEGIVEN = 431,
    /// 432
    ERR_ERRONEUSNICKNAME = 432,
    /// 433
    ERR_NICKNAMEINUSE = 433,
    /// 441
    ERR_USERNOTINCHANNEL = 441,
    /// 442
    ERR_NOTONCHANNEL = 442,
    /// 451
    ERR_NOTREGISTERED = 451,
    /// 461
    ERR_NEEDMOREPARAMS = 461,
    /// 462
    ERR_ALREADYREGISTRED = 462,
    /// 464
    ERR_PASSWDMISMATCH = 464,
    /// 471
    ERR_CHANNELISFULL = 471,
    /// 472
    ERR_UNKNOWNMODE = 472,
    /// 473
    ERR_INVITEONLYCHAN = 473,
    /// 474
    ERR_BANNEDFROMCHAN = 474,
    /// 475
    ERR_BADCHANNELKEY = 475,
    /// 478
    ERR_BANLISTFULL = 478,
    /// 481
    ERR_NOPRIVILEGES = 481,
    /// 482
    ERR_CHANOPRIVSNEEDED = 482,
    /// 501
    ERR_UMODEUNKNOWNFLAG = 501,
    /// 502
    ERR_USERSDONTMATCH = 502,
    /// 696
    ERR_INVALIDMODEPARAM = 696,
    /// 702 - module list entry
    RPL_MODLIST = 702,
    /// 703
    RPL_ENDOFMODLIST = 703,
    /// 972
    ERR_CANTUNLOADMODULE = 972,
    /// 973
    RPL_UNLOADEDMODULE = 973,
    /// 974
    ERR_CANTLOADMODULE = 974,
    /// 975
    RPL_LOADEDMODULE = 975,
}

impl Response {
    /// Three-digit, zero-padded wire form.
    pub fn code(self) -> String {
        format!("{:03}", self as u16)
    }

    /// True for 400-599 error numerics.
    pub fn is_error(self) -> bool {
        (400..600).contains(&(self as u16))
    }
}
