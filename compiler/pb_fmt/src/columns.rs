//! Column Aligner
//!
//! Contiguous runs of field-like siblings (message fields, map fields,
//! enum values) are rendered into logical columns — type, name, `=`, tag,
//! options — padded to the widest row of the alignment sub-group. Runs are
//! split wherever a blank line or a leading comment intervenes, and by a
//! size heuristic inherited from gofmt so one very long declaration does
//! not drag a whole block of short ones wide.
//!
//! Option entries and message-literal fields flow through the same driver
//! but render as single-segment rows: they group and split like everything
//! else, yet carry no padded columns.
//!
//! Rows are rendered speculatively into a scratch sink first; a row whose
//! rendering spans multiple lines (expanded options, compound strings)
//! falls back to its plain writer and breaks the run.

use pb_ast::{
    newline_count, EnumValueNode, FieldNode, MapFieldNode, MessageFieldNode, OptionNode, Spanned,
};

use crate::emitter::Emitter;
use crate::formatter::{identifier_ref, int_value_ref, value_ref, Formatter, NodeRef, PreviousNode};
use crate::literals::separator_or_virtual;

/// Ratio and threshold of the gofmt sub-grouping heuristic: a split is
/// forced when a row's size and the running geometric mean differ by a
/// factor of `RATIO`, provided either side exceeds `SMALL_SIZE`.
const RATIO: f64 = 2.5;
const SMALL_SIZE: usize = 40;

/// One sibling of a body being column-formatted.
pub(crate) enum ColItem<'b> {
    /// An alignable, padded row.
    Row(RowSpec<'b>),
    /// An option entry: grouped but rendered as a single segment.
    Option {
        node: &'b OptionNode,
        style: OptionStyle,
    },
    /// A message-literal field: single segment, separator preserved.
    MessageField(&'b MessageFieldNode),
    /// A non-alignable sibling; breaks any run.
    Other(NodeRef<'b>),
    /// Dropped from output (stray `;`).
    Skip,
}

#[derive(Clone, Copy)]
pub(crate) enum OptionStyle {
    /// `option name = value;` inside a body.
    Declaration,
    /// An entry of an expanded `[ ... ]` list; the last entry drops its
    /// trailing comma.
    CompactEntry { last: bool },
}

/// An alignable declaration plus the node trivia drives prelude decisions
/// with.
pub(crate) struct RowSpec<'b> {
    pub(crate) node: &'b dyn Spanned,
    pub(crate) data: RowData<'b>,
}

impl<'b> RowSpec<'b> {
    pub(crate) fn new(node: &'b dyn Spanned, data: RowData<'b>) -> Self {
        Self { node, data }
    }
}

pub(crate) enum RowData<'b> {
    Field(&'b FieldNode),
    MapField(&'b MapFieldNode),
    EnumValue(&'b EnumValueNode),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Field,
    EnumValue,
}

impl RowData<'_> {
    fn kind(&self) -> RowKind {
        match self {
            RowData::Field(_) | RowData::MapField(_) => RowKind::Field,
            RowData::EnumValue(_) => RowKind::EnumValue,
        }
    }
}

/// A successfully pre-rendered single-line row awaiting width resolution.
struct RenderedRow<'b> {
    spec: RowSpec<'b>,
    kind: RowKind,
    /// Column cells in kind order; absent columns contribute no padding.
    cells: Vec<Option<String>>,
    /// Terminator and trailing comments, through end of line.
    terminator: String,
    /// A blank line or leading comment above: alignment must not cross it.
    split_before: bool,
}

impl RenderedRow<'_> {
    /// The gofmt size metric: type plus name widths.
    fn size(&self) -> usize {
        let first = cell_width(&self.cells[0]);
        let second = if self.kind == RowKind::Field {
            cell_width(&self.cells[1])
        } else {
            0
        };
        first + second
    }
}

fn cell_width(cell: &Option<String>) -> usize {
    cell.as_deref().map_or(0, |c| c.chars().count())
}

impl<E: Emitter> Formatter<'_, E> {
    /// Write a run of body siblings, aligning columns across contiguous
    /// same-kind rows.
    pub(crate) fn column_format(&mut self, items: Vec<ColItem<'_>>) {
        let mut pending: Vec<RenderedRow<'_>> = Vec::new();
        for item in items {
            match item {
                ColItem::Skip => {}
                ColItem::Other(node) => {
                    self.flush_rows(&mut pending);
                    self.write_node(node);
                }
                ColItem::Option { node, style } => {
                    self.flush_rows(&mut pending);
                    match style {
                        OptionStyle::Declaration => self.write_option(node),
                        OptionStyle::CompactEntry { last } => {
                            self.write_compact_option_entry(node, last)
                        }
                    }
                }
                ColItem::MessageField(field) => {
                    self.flush_rows(&mut pending);
                    if let Some(sep) = &field.semicolon {
                        self.write_message_field_with_separator(field);
                        self.write_line_end(NodeRef::Rune(sep));
                    } else {
                        self.write_message_field(field);
                    }
                }
                ColItem::Row(spec) => {
                    if pending
                        .last()
                        .is_some_and(|last| last.kind != spec.data.kind())
                    {
                        self.flush_rows(&mut pending);
                    }
                    match self.try_render_row(spec) {
                        Ok(row) => pending.push(row),
                        Err(spec) => {
                            // Multi-line rendering: break the run and let
                            // the plain writer lay the declaration out.
                            self.flush_rows(&mut pending);
                            match spec.data {
                                RowData::Field(f) => self.write_field(f),
                                RowData::MapField(f) => self.write_map_field(f),
                                RowData::EnumValue(v) => self.write_enum_value(v),
                            }
                        }
                    }
                }
            }
        }
        self.flush_rows(&mut pending);
    }

    /// A compact-option entry on its own line of an expanded list.
    pub(crate) fn write_compact_option_entry(&mut self, node: &OptionNode, last: bool) {
        if last {
            self.write_last_compact_option(node);
            return;
        }
        self.write_option_prefix(node);
        let comma = separator_or_virtual(node.semicolon.as_ref(), ',');
        if let Some(compound) = node.value.as_ref().and_then(|v| v.as_compound_string()) {
            self.write_compound_string_indent_end_inline(compound);
            self.write_line_end(NodeRef::Rune(&comma));
            return;
        }
        if let Some(value) = &node.value {
            self.write_inline(value_ref(value));
        }
        self.write_line_end(NodeRef::Rune(&comma));
    }

    /// Render a row's cells into a scratch sink. Returns the spec back
    /// when any cell spans multiple lines.
    fn try_render_row<'b>(&mut self, spec: RowSpec<'b>) -> Result<RenderedRow<'b>, RowSpec<'b>> {
        let info = self.info_of(spec.node);
        // Alignment never crosses a comment or a blank line.
        let split_before = if info.leading_comments.is_empty() {
            newline_count(info.leading_ws) > 1
        } else {
            true
        };

        let mut scratch = self.save_state();
        let kind = spec.data.kind();
        let (cells, terminator) = match spec.data {
            RowData::Field(field) => scratch.render_field_cells(field),
            RowData::MapField(field) => scratch.render_map_field_cells(field),
            RowData::EnumValue(value) => scratch.render_enum_value_cells(value),
        };
        let errors = scratch.ctx.take_errors();
        let multiline = cells.iter().flatten().any(|cell| cell.contains('\n'));
        if multiline {
            // The fallback writer re-renders and re-reports.
            return Err(spec);
        }
        // The rendering is reused verbatim, so its errors are real.
        for error in errors {
            self.ctx.push_error(error);
        }
        Ok(RenderedRow {
            spec,
            kind,
            cells,
            terminator,
            split_before,
        })
    }

    /// Emit pending rows, padded per alignment sub-group.
    fn flush_rows(&mut self, pending: &mut Vec<RenderedRow<'_>>) {
        if pending.is_empty() {
            return;
        }
        let rows = std::mem::take(pending);

        // Hard boundaries first: comments and blank lines.
        let mut segments: Vec<Vec<RenderedRow<'_>>> = Vec::new();
        for row in rows {
            let boundary = row.split_before;
            match segments.last_mut() {
                Some(segment) if !boundary => segment.push(row),
                _ => segments.push(vec![row]),
            }
        }

        for segment in segments {
            let sizes: Vec<usize> = segment.iter().map(RenderedRow::size).collect();
            for range in split_by_size(&sizes) {
                let group = &segment[range.clone()];
                let columns = group.iter().map(|r| r.cells.len()).max().unwrap_or(0);
                let widths: Vec<usize> = (0..columns)
                    .map(|i| {
                        group
                            .iter()
                            .map(|r| cell_width(r.cells.get(i).unwrap_or(&None)))
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();
                for row in group {
                    self.emit_row(row, &widths);
                }
            }
        }
    }

    fn emit_row(&mut self, row: &RenderedRow<'_>, widths: &[usize]) {
        self.write_start_prelude(row.spec.node, None, false);

        let present: Vec<usize> = row
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.is_some().then_some(i))
            .collect();
        for (k, &column) in present.iter().enumerate() {
            if k > 0 {
                self.ctx.write_str(" ");
            }
            let cell = row.cells[column].as_deref().unwrap_or_default();
            self.ctx.write_str(cell);
            if k + 1 < present.len() {
                let pad = widths[column].saturating_sub(cell.chars().count());
                if pad > 0 {
                    self.ctx.write_str(&" ".repeat(pad));
                }
            }
        }
        self.ctx.write_str(&row.terminator);
        self.previous = PreviousNode::Other;
    }

    // -- cell rendering (on the scratch formatter) --

    /// The node at the head of a cell: written bare (its leading comments
    /// belong to the row prelude), keeping only trailing comments.
    pub(crate) fn write_cell_start(&mut self, node: NodeRef<'_>) {
        let info = self.info_of(node.spanned());
        self.write_node(node);
        if !info.trailing_comments.is_empty() {
            self.write_inline_comments(info.trailing_comments);
        }
        self.set_previous(node);
    }

    fn write_compound_ident_cell(&mut self, node: &pb_ast::CompoundIdentNode) {
        for (i, part) in node.components.iter().enumerate() {
            let part_ref = crate::literals::compound_part_ref(part);
            if i == 0 {
                self.write_cell_start(part_ref);
            } else {
                self.write_inline(part_ref);
            }
        }
    }
}

impl Formatter<'_, crate::emitter::StringEmitter> {
    fn take_cell(&mut self) -> String {
        self.ctx.clear_pending_space();
        self.ctx.take_buffer()
    }

    fn render_field_cells(&mut self, field: &FieldNode) -> (Vec<Option<String>>, String) {
        match &field.label {
            Some(label) => {
                self.write_cell_start(NodeRef::Ident(label));
                self.ctx.space();
                self.write_inline(identifier_ref(&field.field_type));
            }
            None => match &field.field_type {
                pb_ast::IdentifierNode::Compound(compound) => {
                    self.write_compound_ident_cell(compound)
                }
                pb_ast::IdentifierNode::Ident(ident) => {
                    self.write_cell_start(NodeRef::Ident(ident))
                }
            },
        }
        let type_cell = Some(self.take_cell());

        let name_cell = field.name.as_ref().map(|name| {
            self.write_inline(NodeRef::Ident(name));
            self.take_cell()
        });
        let equals_cell = field.equals.as_ref().map(|equals| {
            self.write_inline(NodeRef::Rune(equals));
            self.take_cell()
        });
        let tag_cell = field.tag.as_ref().map(|tag| {
            self.write_inline(NodeRef::Uint(tag));
            self.take_cell()
        });
        let options_cell = field.options.as_ref().map(|options| {
            self.write_node(NodeRef::CompactOptions(options));
            self.take_cell()
        });

        let semi = separator_or_virtual(field.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
        let terminator = self.take_cell();

        (
            vec![type_cell, name_cell, equals_cell, tag_cell, options_cell],
            terminator,
        )
    }

    fn render_map_field_cells(&mut self, field: &MapFieldNode) -> (Vec<Option<String>>, String) {
        self.write_map_type(&field.map_type, false);
        let type_cell = Some(self.take_cell());

        let name_cell = field.name.as_ref().map(|name| {
            self.write_inline(NodeRef::Ident(name));
            self.take_cell()
        });
        let equals_cell = field.equals.as_ref().map(|equals| {
            self.write_inline(NodeRef::Rune(equals));
            self.take_cell()
        });
        let tag_cell = field.tag.as_ref().map(|tag| {
            self.write_inline(NodeRef::Uint(tag));
            self.take_cell()
        });
        let options_cell = field.options.as_ref().map(|options| {
            self.write_node(NodeRef::CompactOptions(options));
            self.take_cell()
        });

        let semi = separator_or_virtual(field.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
        let terminator = self.take_cell();

        (
            vec![type_cell, name_cell, equals_cell, tag_cell, options_cell],
            terminator,
        )
    }

    fn render_enum_value_cells(&mut self, value: &EnumValueNode) -> (Vec<Option<String>>, String) {
        self.write_cell_start(NodeRef::Ident(&value.name));
        let name_cell = Some(self.take_cell());

        let equals_cell = value.equals.as_ref().map(|equals| {
            self.write_inline(NodeRef::Rune(equals));
            self.take_cell()
        });
        let number_cell = value.number.as_ref().map(|number| {
            self.write_inline(int_value_ref(number));
            self.take_cell()
        });
        let options_cell = value.options.as_ref().map(|options| {
            self.write_node(NodeRef::CompactOptions(options));
            self.take_cell()
        });

        let semi = separator_or_virtual(value.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
        let terminator = self.take_cell();

        (
            vec![name_cell, equals_cell, number_cell, options_cell],
            terminator,
        )
    }
}

/// The gofmt sub-grouping walk: split where a row's size and the running
/// geometric mean of the group differ by more than `RATIO`, with sizes at
/// or below `SMALL_SIZE` never forcing a split.
fn split_by_size(sizes: &[usize]) -> Vec<std::ops::Range<usize>> {
    let mut out = Vec::new();
    let mut count = 0usize;
    let mut lower = 0usize;
    let mut size = 0usize;
    let mut lnsum = 0f64;
    for (i, &row_size) in sizes.iter().enumerate() {
        let prev_size = size;
        size = row_size;
        if size > 0
            && prev_size > 0
            && count > 0
            && (prev_size > SMALL_SIZE || size > SMALL_SIZE)
        {
            let mean = (lnsum / count as f64).exp();
            let ratio = size as f64 / mean;
            if RATIO * ratio <= 1.0 || RATIO <= ratio {
                out.push(lower..i);
                lower = i;
                count = 0;
                lnsum = 0.0;
            }
        }
        if size > 0 {
            count += 1;
            lnsum += (size as f64).ln();
        }
    }
    out.push(lower..sizes.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_rows_never_split() {
        let sizes = vec![10, 12, 9, 14];
        assert_eq!(split_by_size(&sizes), vec![0..4]);
    }

    #[test]
    fn large_jump_splits() {
        // 10 vs 120: ratio 12 >= 2.5, and 120 > 40.
        let sizes = vec![10, 10, 120, 118];
        let groups = split_by_size(&sizes);
        assert_eq!(groups, vec![0..2, 2..4]);
    }

    #[test]
    fn large_drop_splits() {
        let sizes = vec![120, 118, 10, 10];
        let groups = split_by_size(&sizes);
        assert_eq!(groups, vec![0..2, 2..4]);
    }

    #[test]
    fn zero_sizes_are_transparent() {
        let sizes = vec![10, 0, 12];
        assert_eq!(split_by_size(&sizes), vec![0..3]);
    }
}
