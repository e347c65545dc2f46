//! Request shapes probed against the provider.
//!
//! The provider's accepted schema is not reliably known, so submission and
//! status lookups walk an ordered list of guesses. The lists are plain data:
//! reorder or extend them without touching the dispatch code in
//! [`crate::submit`] and [`crate::poll`].

use crate::types::GenerationRequest;
use serde_json::{Map, Value, json};

/// How the submission body is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Documented v2 layout with nested `character` and `voice` objects.
    Character,
    /// `{ video_inputs: [input] }`
    VideoInputs,
    /// `{ data: { video_inputs: [input] } }`
    DataVideoInputs,
    /// `{ inputs: [input] }`
    Inputs,
    /// `{ script, avatar, voice }`
    Flat,
    /// `{ input_text, avatar_id, voice_id }`
    FlatIds,
}

impl PayloadShape {
    /// Probed shapes, most likely first.
    pub const PROBED: [PayloadShape; 5] = [
        PayloadShape::VideoInputs,
        PayloadShape::DataVideoInputs,
        PayloadShape::Inputs,
        PayloadShape::Flat,
        PayloadShape::FlatIds,
    ];

    /// Build the JSON body for `request`.
    ///
    /// Identifier fields failing the soft shape check are left out.
    pub fn build(self, request: &GenerationRequest) -> Value {
        let avatar = request
            .avatar_looks_valid()
            .then(|| request.avatar_id.clone());
        let voice = request.voice_looks_valid().then(|| request.voice_id.clone());

        match self {
            PayloadShape::Character => {
                let mut character = object([("type", Some("avatar".to_string()))]);
                insert_opt(&mut character, "avatar_id", avatar);
                character.insert("avatar_style".to_string(), json!("normal"));

                let mut voice_obj = object([
                    ("type", Some("text".to_string())),
                    ("input_text", Some(request.script.clone())),
                ]);
                insert_opt(&mut voice_obj, "voice_id", voice);

                json!({
                    "video_inputs": [{
                        "character": character,
                        "voice": voice_obj,
                    }],
                    "dimension": { "width": 1280, "height": 720 },
                })
            }
            PayloadShape::VideoInputs => json!({ "video_inputs": [canonical_input(request, avatar, voice)] }),
            PayloadShape::DataVideoInputs => {
                json!({ "data": { "video_inputs": [canonical_input(request, avatar, voice)] } })
            }
            PayloadShape::Inputs => json!({ "inputs": [canonical_input(request, avatar, voice)] }),
            PayloadShape::Flat => Value::Object(object([
                ("script", Some(request.script.clone())),
                ("avatar", avatar),
                ("voice", voice),
            ])),
            PayloadShape::FlatIds => Value::Object(object([
                ("input_text", Some(request.script.clone())),
                ("avatar_id", avatar),
                ("voice_id", voice),
            ])),
        }
    }
}

/// Single input entry carrying every alias the provider has been seen to use.
fn canonical_input(request: &GenerationRequest, avatar: Option<String>, voice: Option<String>) -> Value {
    Value::Object(object([
        ("type", Some("avatar".to_string())),
        ("avatar", avatar.clone()),
        ("avatar_id", avatar),
        ("voice", voice.clone()),
        ("voice_id", voice),
        ("input_text", Some(request.script.clone())),
        ("script", Some(request.script.clone())),
    ]))
}

fn object<const N: usize>(fields: [(&str, Option<String>); N]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in fields {
        insert_opt(&mut map, key, value);
    }
    map
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value));
    }
}

/// One submission guess: where to POST and how to shape the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub path: String,
    pub shape: PayloadShape,
}

impl EndpointCandidate {
    pub fn new(path: impl Into<String>, shape: PayloadShape) -> Self {
        Self {
            path: path.into(),
            shape,
        }
    }

    pub fn body(&self, request: &GenerationRequest) -> Value {
        self.shape.build(request)
    }
}

const PROBED_SUBMIT_PATHS: [&str; 6] = [
    "/v2/video.create",
    "/v2/video/generate",
    "/v1/video.create",
    "/v1/video/generate",
    "/v1/video/create",
    "/v1/videos",
];

/// Default submission order: the documented v2 call, then every probed
/// path/shape pair.
pub fn default_submit_candidates() -> Vec<EndpointCandidate> {
    let mut candidates = vec![EndpointCandidate::new(
        "/v2/video/generate",
        PayloadShape::Character,
    )];
    for path in PROBED_SUBMIT_PATHS {
        for shape in PayloadShape::PROBED {
            candidates.push(EndpointCandidate::new(path, shape));
        }
    }
    candidates
}

pub const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// One status lookup guess; the template holds a `{job_id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCandidate {
    pub template: String,
}

impl StatusCandidate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute the percent-encoded job id into the template.
    pub fn render(&self, job_id: &str) -> String {
        self.template
            .replace(JOB_ID_PLACEHOLDER, &urlencoding::encode(job_id))
    }
}

pub fn default_status_candidates() -> Vec<StatusCandidate> {
    [
        "/v1/video_status.get?video_id={job_id}",
        "/v1/video.status?video_id={job_id}",
        "/v1/video/status?video_id={job_id}",
        "/v1/video.status/{job_id}",
        "/v1/video/status/{job_id}",
        "/v2/video/status/{job_id}",
        "/v2/videos/{job_id}",
    ]
    .into_iter()
    .map(StatusCandidate::new)
    .collect()
}
