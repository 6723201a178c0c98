//! Inspection services (C3): stack-frame and variable-enumeration packets,
//! streamed across as many responses as it takes, with a precise
//! end-of-stream contract.

use crate::codec::{truncate_with_ellipsis, CodecError, FrameBuilder, PayloadReader};
use crate::config::{END_TOKEN, MAX_NAME_LEN, MAX_VALUE_LEN};
use crate::traits::{
    FrameChain, ModuleRegistries, NamedChild, ObjectResolver, ObjectView, ValueKind, ValueView,
    VarKind,
};

/// Errors specific to inspection requests.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("unknown scope_kind byte {0}")]
    UnknownScopeKind(u8),

    #[error("no frame is currently stopped")]
    NoCurrentFrame,

    #[error("drill-down handle {0} does not resolve to a live object")]
    UnknownHandle(u32),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// `scope_kind` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    FrameLocals = 1,
    Globals = 2,
    Object = 3,
    FrameStack = 4,
    ModulesBuiltin = 5,
    ModulesExtensible = 6,
    ModulesFrozen = 7,
}

impl ScopeKind {
    fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => ScopeKind::FrameLocals,
            2 => ScopeKind::Globals,
            3 => ScopeKind::Object,
            4 => ScopeKind::FrameStack,
            5 => ScopeKind::ModulesBuiltin,
            6 => ScopeKind::ModulesExtensible,
            7 => ScopeKind::ModulesFrozen,
            _ => return None,
        })
    }
}

/// Decoded `DBG_VARS` request payload.
pub struct VariablesRequest {
    pub scope_kind: ScopeKind,
    pub include_kinds_mask: u8,
    pub depth_or_addr: u32,
    pub start_var_index: u32,
}

/// Decode a `DBG_VARS` payload: `<u8 scope_kind><u8 include_kinds_mask>
/// <u32 depth_or_addr><u32 start_var_index>`.
pub fn decode_variables_request(payload: &[u8]) -> Result<VariablesRequest, InspectError> {
    let r = PayloadReader::new(payload);
    let scope_raw = r.read_u8(0)?;
    let include_kinds_mask = r.read_u8(1)?;
    let depth_or_addr = r.read_u32_le(2)?;
    let start_var_index = r.read_u32_le(6)?;
    let scope_kind = ScopeKind::from_u8(scope_raw).ok_or(InspectError::UnknownScopeKind(scope_raw))?;
    Ok(VariablesRequest { scope_kind, include_kinds_mask, depth_or_addr, start_var_index })
}

/// Decode a `DBG_STAC` payload: `<u32 start_frame_index>`.
pub fn decode_stack_request(payload: &[u8]) -> Result<u32, CodecError> {
    PayloadReader::new(payload).read_u32_le(0)
}

/// Read-only access to everything a `DBG_VARS`/`DBG_STAC` request might
/// address: the current call chain, the three module registries, and the
/// drill-down handle resolver.
pub trait InspectionSource {
    fn frames(&self) -> &dyn FrameChain;
    fn modules(&self) -> &dyn ModuleRegistries;
    fn objects(&self) -> &dyn ObjectResolver;
}

struct LenView(usize);

impl ValueView for LenView {
    fn display_value(&self) -> String {
        self.0.to_string()
    }
    fn type_name(&self) -> &str {
        "number"
    }
    fn kind(&self) -> ValueKind {
        ValueKind::Primitive
    }
    fn drill_handle(&self) -> u32 {
        0
    }
}

fn synthetic_len(len: usize) -> NamedChild {
    NamedChild { name: "len()".to_string(), value: Box::new(LenView(len)) }
}

fn children_of_object(obj: &dyn ObjectView) -> Vec<NamedChild> {
    match obj.kind() {
        ValueKind::List | ValueKind::Tuple | ValueKind::Closure => {
            let mut out = vec![synthetic_len(obj.len())];
            for i in 0..obj.len() {
                if let Some(value) = obj.index_child(i) {
                    out.push(NamedChild { name: format!("[{i}]"), value });
                }
            }
            out
        }
        ValueKind::Str => vec![synthetic_len(obj.len())],
        ValueKind::Cell => match obj.deref_cell() {
            Some(value) => vec![NamedChild { name: "value".to_string(), value }],
            None => vec![],
        },
        _ => obj.iter_named().collect(),
    }
}

/// Build the ordered list of entries a `DBG_VARS` request should enumerate,
/// before pagination/classification/truncation.
fn named_children_for(
    req: &VariablesRequest,
    source: &dyn InspectionSource,
) -> Result<Vec<NamedChild>, InspectError> {
    match req.scope_kind {
        ScopeKind::FrameLocals => {
            let frame = source.frames().frame(0).ok_or(InspectError::NoCurrentFrame)?;
            let locals = frame.locals();
            let names = frame.local_names();
            let n = locals.slot_count();
            let mut out = Vec::with_capacity(n);
            // Walk the underlying array in reverse (newest is at the
            // front); reverse_position increases in declaration order.
            for i in (0..n).rev() {
                let reverse_position = n - 1 - i;
                match names.name_for_local_index(reverse_position) {
                    Some(name) => {
                        out.push(NamedChild { name: name.to_string(), value: locals.slot_value(i) })
                    }
                    // Compiler-generated temporary: enumeration ends here.
                    None => break,
                }
            }
            Ok(out)
        }
        ScopeKind::FrameStack => {
            let frame = source.frames().frame(0).ok_or(InspectError::NoCurrentFrame)?;
            let locals = frame.locals();
            let n = locals.slot_count();
            Ok((0..n)
                .map(|i| NamedChild { name: format!("[{i}]"), value: locals.slot_value(i) })
                .collect())
        }
        ScopeKind::Globals => {
            let frame = source.frames().frame(0).ok_or(InspectError::NoCurrentFrame)?;
            Ok(frame.globals().iter_named().collect())
        }
        ScopeKind::Object => {
            let obj = source
                .objects()
                .resolve(req.depth_or_addr)
                .ok_or(InspectError::UnknownHandle(req.depth_or_addr))?;
            Ok(children_of_object(obj.as_ref()))
        }
        ScopeKind::ModulesBuiltin => Ok(source.modules().builtin().iter_named().collect()),
        ScopeKind::ModulesExtensible => Ok(source.modules().extensible().iter_named().collect()),
        ScopeKind::ModulesFrozen => Ok(source.modules().frozen().iter_named().collect()),
    }
}

/// Render a `DBG_VARS` response into `out`. Returns whether the end-token
/// was appended (i.e. enumeration reached its natural end and the token
/// fit).
pub fn variables_response(
    req: &VariablesRequest,
    source: &dyn InspectionSource,
    out: &mut FrameBuilder,
) -> Result<bool, InspectError> {
    let contains_kinds_offset = out.len();
    out.append_u8(0)?;

    let entries = named_children_for(req, source)?;
    let mut contains_kinds = 0u8;
    let mut reached_end = true;

    for (idx, entry) in entries.into_iter().enumerate() {
        let value_kind = entry.value.kind();
        let var_kind = VarKind::classify(&entry.name, value_kind);
        contains_kinds |= var_kind.bit();

        if (idx as u32) < req.start_var_index {
            continue;
        }
        if var_kind.bit() & req.include_kinds_mask == 0 {
            continue;
        }

        let name = truncate_with_ellipsis(&entry.name, MAX_NAME_LEN);
        let value_text = truncate_with_ellipsis(&entry.value.display_value(), MAX_VALUE_LEN);
        let type_name = truncate_with_ellipsis(entry.value.type_name(), MAX_NAME_LEN);
        let handle = if value_kind.is_reenumerable() { entry.value.drill_handle() } else { 0 };

        let record_len = name.len() + 1 + value_text.len() + 1 + type_name.len() + 1 + 4;
        if record_len > out.remaining() {
            reached_end = false;
            break;
        }
        out.append_zstr(&name)?;
        out.append_zstr(&value_text)?;
        out.append_zstr(&type_name)?;
        out.append_u32_le(handle)?;
    }

    out.set_u8_at(contains_kinds_offset, contains_kinds);

    let mut end_appended = false;
    if reached_end && out.remaining() >= END_TOKEN.len() {
        out.append_bytes(END_TOKEN)?;
        end_appended = true;
    }
    Ok(end_appended)
}

/// Render a `DBG_STAC` response into `out`: concatenated
/// `(zstr file, zstr block, u32 line, u32 frame_idx)` records starting
/// from `start_frame_index`. Returns whether the end-token was appended.
pub fn stack_response(
    chain: &dyn FrameChain,
    start_frame_index: u32,
    out: &mut FrameBuilder,
) -> Result<bool, CodecError> {
    let len = chain.len();
    let mut idx = start_frame_index;
    let mut reached_end = idx >= len;

    while idx < len {
        let frame = chain.frame(idx).expect("idx < len");
        let file_name = frame.file_name();
        let block_name = frame.block_name();
        let record_len = file_name.len() + 1 + block_name.len() + 1 + 4 + 4;
        if record_len > out.remaining() {
            reached_end = false;
            break;
        }
        out.append_zstr(file_name)?;
        out.append_zstr(block_name)?;
        out.append_u32_le(frame.line())?;
        out.append_u32_le(idx)?;
        idx += 1;
        reached_end = idx >= len;
    }

    let mut end_appended = false;
    if reached_end && out.remaining() >= END_TOKEN.len() {
        out.append_bytes(END_TOKEN)?;
        end_appended = true;
    }
    Ok(end_appended)
}

/// Render a `DBG_EXCP` response: the exception's traceback text,
/// truncated to the remaining packet budget with a `...` suffix.
pub fn exception_response(text: &str, out: &mut FrameBuilder) -> Result<(), CodecError> {
    let budget = out.remaining();
    let truncated = truncate_with_ellipsis(text, budget);
    out.append_raw_str(&truncated)
}
