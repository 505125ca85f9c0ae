#![forbid(unsafe_code)]

//! Target resolution: substituting the owned element for placeholders.
//!
//! A pure structural transform over [`Request`]: every
//! [`Target::Owned`] in a single call, a sequence step, or a group member
//! becomes the controller's owned element. Explicit targets pass through
//! untouched, so resolution is idempotent — resolving an already-resolved
//! request is a no-op.

use choreo_core::{Call, Element, Request, Sequence, Step, Target};

/// Resolve every placeholder target in `request` against `owned`.
#[must_use]
pub fn resolve_request(request: Request, owned: &Element) -> Request {
    match request {
        Request::Single(call) => Request::Single(resolve_call(call, owned)),
        Request::Sequence(seq) => Request::Sequence(resolve_sequence(seq, owned)),
    }
}

/// Resolve every placeholder target in a sequence.
#[must_use]
pub fn resolve_sequence(seq: Sequence, owned: &Element) -> Sequence {
    seq.steps()
        .iter()
        .map(|step| match step {
            Step::Single(call) => Step::Single(resolve_call(call.clone(), owned)),
            Step::Group(calls) => Step::Group(
                calls
                    .iter()
                    .map(|c| resolve_call(c.clone(), owned))
                    .collect(),
            ),
        })
        .collect()
}

fn resolve_call(mut call: Call, owned: &Element) -> Call {
    if call.target.is_owned() {
        call.target = Target::Element(owned.clone());
    }
    call
}
