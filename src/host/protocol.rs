use serde::{Deserialize, Serialize};

use crate::{
    aggregation::DetailsReport,
    store::usage_store::{RecordOutcome, Summary},
};

/// Messages sent by the page overlay. Field names follow the extension's message format.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    IncrementTime {
        domain: String,
        #[serde(default)]
        delta_ms: u64,
    },
    GetSummary {
        domain: String,
    },
    GetDetails {
        domain: String,
    },
    ToggleDomain {
        domain: String,
    },
}

#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
pub struct Response {
    pub ok: bool,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
#[serde(untagged)]
pub enum ResponseBody {
    Recorded {
        #[serde(flatten)]
        outcome: RecordOutcome,
        summary: Summary,
    },
    Toggled {
        disabled: bool,
        summary: Summary,
    },
    Summary {
        summary: Summary,
    },
    Details {
        details: DetailsReport,
    },
    Failed {
        error: String,
    },
}

impl Response {
    pub fn success(body: ResponseBody) -> Self {
        Self { ok: true, body }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            body: ResponseBody::Failed {
                error: error.into(),
            },
        }
    }
}
