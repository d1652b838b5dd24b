//! Request body capture policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::truncate::Limits;
use crate::model::RequestBody;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Which events may carry a captured request body.
///
/// Values form a bitmask: `All` is `Errors | Transactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBodyMode {
    #[default]
    Off = 0,
    Errors = 1,
    Transactions = 2,
    All = 3,
}

impl CaptureBodyMode {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Reports whether the two modes share any event kind.
    pub fn intersects(self, other: CaptureBodyMode) -> bool {
        self.bits() & other.bits() != 0
    }
}

/// A request body buffered for possible capture.
///
/// Produced by the tracer only when its policy is not [`CaptureBodyMode::Off`].
#[derive(Debug, Clone)]
pub struct BodyCapturer {
    mode: CaptureBodyMode,
    content_type: String,
    body: Vec<u8>,
}

impl BodyCapturer {
    pub fn new(mode: CaptureBodyMode, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            mode,
            content_type: content_type.into(),
            body,
        }
    }

    pub fn mode(&self) -> CaptureBodyMode {
        self.mode
    }

    /// Decode the buffered body. Returns `None` for an empty body.
    pub(crate) fn to_request_body(&self, limits: &Limits) -> Option<RequestBody> {
        if self.body.is_empty() {
            return None;
        }
        if is_form(&self.content_type) {
            let mut form: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (name, value) in url::form_urlencoded::parse(&self.body) {
                form.entry(name.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
            return Some(RequestBody::Form(form));
        }
        let text = String::from_utf8_lossy(&self.body);
        Some(RequestBody::Raw(limits.truncate_text(&text).to_string()))
    }
}

fn is_form(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}
