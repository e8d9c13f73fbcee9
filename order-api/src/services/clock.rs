//! System clock

use chrono::{Local, NaiveDateTime, Utc};

use crate::traits::Clock;

/// Wall clock in server-local time, or UTC when configured
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    utc: bool,
}

impl SystemClock {
    pub fn local() -> Self {
        Self { utc: false }
    }

    pub fn utc() -> Self {
        Self { utc: true }
    }

    pub fn is_utc(&self) -> bool {
        self.utc
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        if self.utc {
            Utc::now().naive_utc()
        } else {
            Local::now().naive_local()
        }
    }
}
