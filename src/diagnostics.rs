//! Reply and reboot counters, persisted alongside the configuration.

use crate::error::{Error, Result};

/// Classification of a reply sent by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    ReadOnly,
    InvalidCommand,
    InvalidArgument,
}

impl Reply {
    /// Classify the outcome of a command.
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Reply::Ok,
            Err(Error::ReadOnly) => Reply::ReadOnly,
            Err(Error::NotFound | Error::OutOfRange) => Reply::InvalidCommand,
            Err(Error::InvalidArgument | Error::StorageCorrupt(_)) => Reply::InvalidArgument,
        }
    }
}

/// Monotonic counters. They saturate instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// `:DIAGnostic:REPLy:TOTal`
    pub reply_total: u32,
    /// `:DIAGnostic:REPLy:READonly`
    pub reply_readonly: u32,
    /// `:DIAGnostic:REPLy:INVCmd`
    pub reply_invalid_cmd: u32,
    /// `:DIAGnostic:REPLy:INVArg`
    pub reply_invalid_arg: u32,
    /// `:DIAGnostic:REBoot`
    pub reboot_count: u32,
}

impl Diagnostics {
    pub fn record(&mut self, reply: Reply) {
        self.reply_total = self.reply_total.saturating_add(1);
        let counter = match reply {
            Reply::Ok => return,
            Reply::ReadOnly => &mut self.reply_readonly,
            Reply::InvalidCommand => &mut self.reply_invalid_cmd,
            Reply::InvalidArgument => &mut self.reply_invalid_arg,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn record_reboot(&mut self) {
        self.reboot_count = self.reboot_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_are_classified() {
        assert_eq!(Reply::from_result(&Ok(())), Reply::Ok);
        assert_eq!(Reply::from_result::<()>(&Err(Error::ReadOnly)), Reply::ReadOnly);
        assert_eq!(Reply::from_result::<()>(&Err(Error::NotFound)), Reply::InvalidCommand);
        assert_eq!(Reply::from_result::<()>(&Err(Error::OutOfRange)), Reply::InvalidCommand);
        assert_eq!(
            Reply::from_result::<()>(&Err(Error::InvalidArgument)),
            Reply::InvalidArgument
        );
    }

    #[test]
    fn counters() {
        let mut diag = Diagnostics::default();
        diag.record(Reply::Ok);
        diag.record(Reply::ReadOnly);
        diag.record(Reply::InvalidCommand);
        diag.record(Reply::InvalidArgument);
        diag.record(Reply::InvalidArgument);
        diag.record_reboot();

        assert_eq!(diag.reply_total, 5);
        assert_eq!(diag.reply_readonly, 1);
        assert_eq!(diag.reply_invalid_cmd, 1);
        assert_eq!(diag.reply_invalid_arg, 2);
        assert_eq!(diag.reboot_count, 1);
    }

    #[test]
    fn counters_saturate() {
        let mut diag = Diagnostics {
            reply_total: u32::MAX,
            ..Default::default()
        };
        diag.record(Reply::Ok);
        assert_eq!(diag.reply_total, u32::MAX);
    }
}
