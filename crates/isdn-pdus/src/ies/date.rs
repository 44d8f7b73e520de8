use core::fmt;

use chrono::{Datelike, Local, Timelike};

use isdn_core::{PduParseErr, expect_min_len};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// Date/time IE as sent by the network in CONNECT. Year is modulo 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl DateTime {
    pub fn from_chrono<T: Datelike + Timelike>(t: &T) -> Self {
        DateTime {
            year: (t.year().rem_euclid(100)) as u8,
            month: t.month() as u8,
            day: t.day() as u8,
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }

    /// Local wall clock time
    pub fn now() -> Self {
        Self::from_chrono(&Local::now())
    }
}

impl InfoElement for DateTime {
    const TAG: IeTag = IeTag::Date;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 5, "date")?;
        Ok(DateTime {
            year: body[0],
            month: body[1],
            day: body[2],
            hour: body[3],
            minute: body[4],
        })
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        out.extend_from_slice(&[self.year, self.month, self.day, self.hour, self.minute]);
        Ok(())
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:02} {:02}:{:02}", self.year, self.month, self.day, self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use isdn_core::{TrunkType, debug};

    #[test]
    fn test_date_from_chrono() {
        debug::setup_logging_verbose();
        let t = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(13, 7, 0).unwrap();
        let d = DateTime::from_chrono(&t);
        let ctx = IeCtx::new(TrunkType::Bri);
        let mut out = Vec::new();
        d.to_body(&mut out, &ctx).unwrap();
        assert_eq!(out, vec![24, 2, 29, 13, 7]);
        assert_eq!(DateTime::from_body(&out, &ctx).unwrap(), d);
        assert!(DateTime::from_body(&out[..4], &ctx).is_err());
    }
}
