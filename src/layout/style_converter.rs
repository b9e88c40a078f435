//! Converts [`LayoutProps`] directly to [`taffy::Style`].
//!
//! There is no cascade here: every field on `LayoutProps` is already the
//! resolved value for its node, so this is a straight one-to-one mapping
//! from our layout vocabulary to Taffy's.

use taffy::prelude::*;
use taffy::Overflow as TaffyOverflow;

use crate::vnode::{Align, Direction, Edges, Justify, Length, LayoutProps, Overflow, Position};

/// Convert this node's layout props to a Taffy style. `is_grid` selects
/// `Display::Grid` and populates the grid template tracks; every other
/// kind gets `Display::Flex` (there is no block layout in this crate — a
/// single child under `Display::Flex` behaves the same as `Display::Block`
/// would, so `VNodeKind::BoxContainer` just uses flex too).
pub fn layout_props_to_taffy(props: &LayoutProps, is_grid: bool) -> Style {
    let mut style = Style::default();

    style.display = Display::Flex;
    style.flex_direction = to_flex_direction(props.direction);
    style.flex_grow = props.flex_grow;
    style.flex_shrink = if props.flex_shrink == 0.0 && !is_grid { 1.0 } else { props.flex_shrink };
    style.flex_basis = to_dimension(props.flex_basis);
    style.flex_wrap = if props.wrap_lines { FlexWrap::Wrap } else { FlexWrap::NoWrap };

    style.justify_content = to_justify_content(props.justify_content);
    style.align_items = Some(to_align_items(props.align_items));
    style.align_self = props.align_self.map(to_align_items);

    let gap = to_length_percentage(Length::Cells(props.gap));
    style.gap = taffy::Size { width: gap, height: gap };

    style.size.width = to_dimension(props.width);
    style.size.height = to_dimension(props.height);
    style.min_size.width = to_dimension(props.min_width);
    style.min_size.height = to_dimension(props.min_height);
    style.max_size.width = to_dimension(props.max_width);
    style.max_size.height = to_dimension(props.max_height);

    style.margin = edges_to_rect_auto(props.margin);
    style.padding = edges_to_rect(props.padding);
    style.border = border_to_rect(props.border);

    let overflow_x = to_overflow(props.overflow_x);
    let overflow_y = to_overflow(props.overflow_y);
    style.overflow = taffy::Point { x: overflow_x, y: overflow_y };

    style.position = match props.position {
        Position::Relative => taffy::Position::Relative,
        Position::Absolute => taffy::Position::Absolute,
    };
    if props.position == Position::Absolute {
        style.inset = taffy::Rect {
            left: props.inset_x.map(|v| LengthPercentageAuto::Length(v as f32)).unwrap_or(LengthPercentageAuto::Auto),
            top: props.inset_y.map(|v| LengthPercentageAuto::Length(v as f32)).unwrap_or(LengthPercentageAuto::Auto),
            right: LengthPercentageAuto::Auto,
            bottom: LengthPercentageAuto::Auto,
        };
    }

    if is_grid {
        style.display = Display::Grid;
    }

    style
}

fn to_dimension(length: Length) -> Dimension {
    match length {
        Length::Auto => Dimension::Auto,
        Length::Cells(n) => Dimension::Length(f32::from(n)),
        Length::Percent(p) => Dimension::Percent(p / 100.0),
    }
}

fn to_length_percentage(length: Length) -> LengthPercentage {
    match length {
        Length::Auto => LengthPercentage::Length(0.0),
        Length::Cells(n) => LengthPercentage::Length(f32::from(n)),
        Length::Percent(p) => LengthPercentage::Percent(p / 100.0),
    }
}

fn to_length_percentage_auto(length: Length) -> LengthPercentageAuto {
    match length {
        Length::Auto => LengthPercentageAuto::Auto,
        Length::Cells(n) => LengthPercentageAuto::Length(f32::from(n)),
        Length::Percent(p) => LengthPercentageAuto::Percent(p / 100.0),
    }
}

fn to_flex_direction(direction: Direction) -> FlexDirection {
    match direction {
        Direction::Row => FlexDirection::Row,
        Direction::Column => FlexDirection::Column,
    }
}

fn to_justify_content(justify: Justify) -> Option<JustifyContent> {
    Some(match justify {
        Justify::Start => JustifyContent::Start,
        Justify::Center => JustifyContent::Center,
        Justify::End => JustifyContent::End,
        Justify::SpaceBetween => JustifyContent::SpaceBetween,
        Justify::SpaceAround => JustifyContent::SpaceAround,
    })
}

fn to_align_items(align: Align) -> AlignItems {
    match align {
        Align::Stretch => AlignItems::Stretch,
        Align::Start => AlignItems::Start,
        Align::Center => AlignItems::Center,
        Align::End => AlignItems::End,
    }
}

fn to_overflow(overflow: Overflow) -> TaffyOverflow {
    match overflow {
        Overflow::Visible => TaffyOverflow::Visible,
        Overflow::Hidden => TaffyOverflow::Hidden,
        Overflow::Scroll => TaffyOverflow::Scroll,
    }
}

fn edges_to_rect(edges: Edges) -> taffy::Rect<LengthPercentage> {
    taffy::Rect {
        left: to_length_percentage(Length::Cells(edges.left)),
        right: to_length_percentage(Length::Cells(edges.right)),
        top: to_length_percentage(Length::Cells(edges.top)),
        bottom: to_length_percentage(Length::Cells(edges.bottom)),
    }
}

fn edges_to_rect_auto(edges: Edges) -> taffy::Rect<LengthPercentageAuto> {
    taffy::Rect {
        left: to_length_percentage_auto(Length::Cells(edges.left)),
        right: to_length_percentage_auto(Length::Cells(edges.right)),
        top: to_length_percentage_auto(Length::Cells(edges.top)),
        bottom: to_length_percentage_auto(Length::Cells(edges.bottom)),
    }
}

/// Terminal cells are the smallest addressable unit, so a configured border
/// edge is always exactly 1 cell wide when present, never a fractional or
/// multi-cell thickness.
fn border_to_rect(edges: Edges) -> taffy::Rect<LengthPercentage> {
    taffy::Rect {
        left: LengthPercentage::Length(if edges.left > 0 { 1.0 } else { 0.0 }),
        right: LengthPercentage::Length(if edges.right > 0 { 1.0 } else { 0.0 }),
        top: LengthPercentage::Length(if edges.top > 0 { 1.0 } else { 0.0 }),
        bottom: LengthPercentage::Length(if edges.bottom > 0 { 1.0 } else { 0.0 }),
    }
}
