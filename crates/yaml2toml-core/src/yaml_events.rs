//! Event-level YAML reader.
//!
//! `serde_yaml` resolves `!!` tags and forgets scalar styles before any value
//! is handed out. The safe decoder needs both: a foreign `!!python/...` tag
//! must be refused, and `'2024-01-01'` must stay a string while `2024-01-01`
//! becomes a date. This module drives libyaml directly and yields owned
//! events carrying tags, anchors, styles and source positions.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::slice;

use unsafe_libyaml as sys;

use crate::error::Location;

#[derive(Debug)]
pub(crate) enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Alias(String),
    Scalar(Scalar),
    SequenceStart(NodeStart),
    SequenceEnd,
    MappingStart(NodeStart),
    MappingEnd,
}

#[derive(Debug)]
pub(crate) struct Scalar {
    pub anchor: Option<String>,
    /// Fully resolved tag: `!!int` arrives as `tag:yaml.org,2002:int`.
    pub tag: Option<String>,
    pub value: String,
    /// Unquoted flow scalar, subject to implicit type resolution.
    pub plain: bool,
}

#[derive(Debug)]
pub(crate) struct NodeStart {
    pub anchor: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ParseError {
    pub message: String,
    pub location: Location,
}

/// Pull parser over one input string.
pub(crate) struct EventReader<'input> {
    // Boxed: libyaml keeps a pointer to the parser itself for its string
    // reader, so the struct must not move once initialized.
    parser: Box<MaybeUninit<sys::yaml_parser_t>>,
    input: PhantomData<&'input [u8]>,
}

impl<'input> EventReader<'input> {
    pub fn new(input: &'input str) -> Result<Self, ParseError> {
        let mut parser = Box::new(MaybeUninit::<sys::yaml_parser_t>::uninit());
        let ptr = parser.as_mut_ptr();
        // SAFETY: `ptr` is a live heap allocation; `input` outlives the
        // reader through the `'input` lifetime.
        unsafe {
            if sys::yaml_parser_initialize(ptr).fail {
                return Err(ParseError {
                    message: "failed to initialize the YAML parser".to_string(),
                    location: Location { line: 1, column: 1 },
                });
            }
            sys::yaml_parser_set_encoding(ptr, sys::YAML_UTF8_ENCODING);
            sys::yaml_parser_set_input_string(ptr, input.as_ptr(), input.len() as u64);
        }
        Ok(Self {
            parser,
            input: PhantomData,
        })
    }

    /// Next event and the position where it starts.
    pub fn next_event(&mut self) -> Result<(Event, Location), ParseError> {
        let parser = self.parser.as_mut_ptr();
        let mut event = MaybeUninit::<sys::yaml_event_t>::uninit();
        // SAFETY: the parser was initialized in `new`. A successful parse
        // fully initializes `event`, which is deleted after its data is copied.
        unsafe {
            let event = event.as_mut_ptr();
            if sys::yaml_parser_parse(parser, event).fail {
                return Err(parse_error(parser));
            }
            let location = location((*event).start_mark);
            let converted = convert_event(&*event);
            sys::yaml_event_delete(event);
            match converted {
                Some(converted) => Ok((converted, location)),
                None => Err(ParseError {
                    message: "unexpected parser event".to_string(),
                    location,
                }),
            }
        }
    }
}

impl Drop for EventReader<'_> {
    fn drop(&mut self) {
        // SAFETY: constructed only after a successful initialize.
        unsafe { sys::yaml_parser_delete(self.parser.as_mut_ptr()) }
    }
}

unsafe fn convert_event(event: &sys::yaml_event_t) -> Option<Event> {
    Some(match event.type_ {
        sys::YAML_STREAM_START_EVENT => Event::StreamStart,
        sys::YAML_STREAM_END_EVENT => Event::StreamEnd,
        sys::YAML_DOCUMENT_START_EVENT => Event::DocumentStart,
        sys::YAML_DOCUMENT_END_EVENT => Event::DocumentEnd,
        sys::YAML_ALIAS_EVENT => Event::Alias(owned(event.data.alias.anchor.cast_const())?),
        sys::YAML_SCALAR_EVENT => {
            let scalar = &event.data.scalar;
            let bytes = if scalar.value.is_null() {
                &[][..]
            } else {
                slice::from_raw_parts(scalar.value, scalar.length as usize)
            };
            Event::Scalar(Scalar {
                anchor: owned(scalar.anchor.cast_const()),
                tag: owned(scalar.tag.cast_const()),
                value: String::from_utf8_lossy(bytes).into_owned(),
                plain: scalar.style == sys::YAML_PLAIN_SCALAR_STYLE,
            })
        }
        sys::YAML_SEQUENCE_START_EVENT => Event::SequenceStart(NodeStart {
            anchor: owned(event.data.sequence_start.anchor.cast_const()),
            tag: owned(event.data.sequence_start.tag.cast_const()),
        }),
        sys::YAML_SEQUENCE_END_EVENT => Event::SequenceEnd,
        sys::YAML_MAPPING_START_EVENT => Event::MappingStart(NodeStart {
            anchor: owned(event.data.mapping_start.anchor.cast_const()),
            tag: owned(event.data.mapping_start.tag.cast_const()),
        }),
        sys::YAML_MAPPING_END_EVENT => Event::MappingEnd,
        _ => return None,
    })
}

/// Copy a NUL-terminated libyaml string.
unsafe fn owned<T>(ptr: *const T) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr.cast()).to_string_lossy().into_owned())
}

unsafe fn parse_error(parser: *const sys::yaml_parser_t) -> ParseError {
    let problem = owned((&(*parser)).problem).unwrap_or_else(|| "malformed YAML".to_string());
    let message = match owned((&(*parser)).context) {
        Some(context) => format!("{problem}, {context}"),
        None => problem,
    };
    ParseError {
        message,
        location: location((&(*parser)).problem_mark),
    }
}

fn location(mark: sys::yaml_mark_t) -> Location {
    Location {
        line: mark.line as usize + 1,
        column: mark.column as usize + 1,
    }
}
