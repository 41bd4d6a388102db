//! Navigation commands
//!
//! Requests that cross views (open the annotations panel, jump to an
//! annotation in another unit) are plain values handled by the
//! [`Navigator`]. Handling is synchronous and returns the effect the
//! caller must carry out, such as loading a unit or scrolling to a row.

use serde::{Deserialize, Serialize};

use crate::marks::Annotation;
use crate::range::RowId;
use crate::verses::UnitId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    SelectHizb {
        hizb: i64,
    },
    #[serde(rename_all = "camelCase")]
    OpenUnit {
        hizb: i64,
        quarter: i64,
        #[serde(default)]
        focus_row: Option<RowId>,
    },
    NextQuarter,
    PrevQuarter,
    NextHizb,
    PrevHizb,
    OpenAnnotationsPanel,
    CloseAnnotationsPanel,
    JumpToAnnotation {
        id: String,
    },
    Back,
}

/// What the caller must do after a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum Effect {
    ShowHizbs,
    ShowQuarters { hizb: i64 },
    LoadUnit { unit: UnitId },
    #[serde(rename_all = "camelCase")]
    ScrollTo { row_id: RowId },
    PanelVisibility { open: bool },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum View {
    Hizbs,
    Quarters { hizb: i64 },
    Reading { unit: UnitId },
}

/// View state of the reader
#[derive(Debug, Clone)]
pub struct Navigator {
    view: View,
    panel_open: bool,
    pending_scroll: Option<RowId>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            view: View::Hizbs,
            panel_open: false,
            pending_scroll: None,
        }
    }
}

impl Navigator {
    pub fn view(&self) -> View {
        self.view
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    fn current_unit(&self) -> Option<UnitId> {
        match self.view {
            View::Reading { unit } => Some(unit),
            _ => None,
        }
    }

    fn load(&mut self, unit: UnitId) -> Effect {
        self.view = View::Reading { unit };
        Effect::LoadUnit { unit }
    }

    /// Apply a command. `annotations` is the working set used to locate
    /// jump targets.
    pub fn dispatch(&mut self, command: Command, annotations: &[Annotation]) -> Effect {
        match command {
            Command::SelectHizb { hizb } => match UnitId::new(hizb, 1) {
                Some(_) => {
                    self.view = View::Quarters { hizb };
                    Effect::ShowQuarters { hizb }
                }
                None => Effect::None,
            },
            Command::OpenUnit {
                hizb,
                quarter,
                focus_row,
            } => match UnitId::new(hizb, quarter) {
                Some(unit) => {
                    self.pending_scroll = focus_row;
                    self.load(unit)
                }
                None => {
                    tracing::debug!(hizb, quarter, "ignoring unit outside the mushaf");
                    Effect::None
                }
            },
            Command::NextQuarter => match self.current_unit().and_then(UnitId::next) {
                Some(unit) => self.load(unit),
                None => Effect::None,
            },
            Command::PrevQuarter => match self.current_unit().and_then(UnitId::prev) {
                Some(unit) => self.load(unit),
                None => Effect::None,
            },
            Command::NextHizb | Command::PrevHizb => {
                let View::Quarters { hizb } = self.view else {
                    return Effect::None;
                };
                let target = if command == Command::NextHizb {
                    hizb + 1
                } else {
                    hizb - 1
                };
                self.dispatch(Command::SelectHizb { hizb: target }, annotations)
            }
            Command::OpenAnnotationsPanel => match self.view {
                View::Reading { .. } => {
                    self.panel_open = true;
                    Effect::PanelVisibility { open: true }
                }
                View::Quarters { hizb } => {
                    self.panel_open = true;
                    self.load(UnitId { hizb, quarter: 1 })
                }
                View::Hizbs => Effect::None,
            },
            Command::CloseAnnotationsPanel => {
                self.panel_open = false;
                Effect::PanelVisibility { open: false }
            }
            Command::JumpToAnnotation { id } => {
                let Some(target) = annotations.iter().find(|a| a.id == id) else {
                    tracing::debug!(annotation = %id, "jump target not in working set");
                    return Effect::None;
                };
                let row_id = target.start.row_id;
                match (self.current_unit(), UnitId::new(target.hizb, target.quarter)) {
                    (Some(current), Some(unit)) if current == unit => Effect::ScrollTo { row_id },
                    (_, Some(unit)) => {
                        self.panel_open = false;
                        self.pending_scroll = Some(row_id);
                        self.load(unit)
                    }
                    (_, None) => Effect::None,
                }
            }
            Command::Back => match self.view {
                View::Reading { unit } => {
                    self.view = View::Quarters { hizb: unit.hizb };
                    self.pending_scroll = None;
                    Effect::ShowQuarters { hizb: unit.hizb }
                }
                View::Quarters { .. } => {
                    self.view = View::Hizbs;
                    Effect::ShowHizbs
                }
                View::Hizbs => Effect::None,
            },
        }
    }

    /// Called once a requested unit has loaded; yields the row to scroll to
    pub fn unit_loaded(&mut self) -> Option<RowId> {
        self.pending_scroll.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::test_support::annotation;
    use crate::marks::AnnotationType;

    fn reading(hizb: i64, quarter: i64) -> Navigator {
        let mut nav = Navigator::default();
        nav.dispatch(
            Command::OpenUnit {
                hizb,
                quarter,
                focus_row: None,
            },
            &[],
        );
        nav
    }

    #[test]
    fn test_open_unit_validates_bounds() {
        let mut nav = Navigator::default();
        let effect = nav.dispatch(
            Command::OpenUnit {
                hizb: 61,
                quarter: 1,
                focus_row: None,
            },
            &[],
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(nav.view(), View::Hizbs);
    }

    #[test]
    fn test_quarter_navigation_stops_at_ends() {
        let mut nav = reading(1, 1);
        assert_eq!(nav.dispatch(Command::PrevQuarter, &[]), Effect::None);

        let mut nav = reading(60, 4);
        assert_eq!(nav.dispatch(Command::NextQuarter, &[]), Effect::None);

        let mut nav = reading(7, 4);
        assert_eq!(
            nav.dispatch(Command::NextQuarter, &[]),
            Effect::LoadUnit {
                unit: UnitId { hizb: 8, quarter: 1 }
            }
        );
    }

    #[test]
    fn test_hizb_navigation_only_in_quarter_picker() {
        let mut nav = Navigator::default();
        nav.dispatch(Command::SelectHizb { hizb: 60 }, &[]);
        assert_eq!(nav.dispatch(Command::NextHizb, &[]), Effect::None);
        assert_eq!(
            nav.dispatch(Command::PrevHizb, &[]),
            Effect::ShowQuarters { hizb: 59 }
        );

        let mut nav = reading(5, 2);
        assert_eq!(nav.dispatch(Command::NextHizb, &[]), Effect::None);
    }

    #[test]
    fn test_back_walks_up_views() {
        let mut nav = reading(5, 2);
        assert_eq!(nav.dispatch(Command::Back, &[]), Effect::ShowQuarters { hizb: 5 });
        assert_eq!(nav.dispatch(Command::Back, &[]), Effect::ShowHizbs);
        assert_eq!(nav.dispatch(Command::Back, &[]), Effect::None);
    }

    #[test]
    fn test_open_panel_from_quarter_picker_defaults_to_first_quarter() {
        let mut nav = Navigator::default();
        assert_eq!(nav.dispatch(Command::OpenAnnotationsPanel, &[]), Effect::None);

        nav.dispatch(Command::SelectHizb { hizb: 12 }, &[]);
        assert_eq!(
            nav.dispatch(Command::OpenAnnotationsPanel, &[]),
            Effect::LoadUnit {
                unit: UnitId { hizb: 12, quarter: 1 }
            }
        );
        assert!(nav.panel_open());

        assert_eq!(
            nav.dispatch(Command::CloseAnnotationsPanel, &[]),
            Effect::PanelVisibility { open: false }
        );
        assert_eq!(
            nav.dispatch(Command::OpenAnnotationsPanel, &[]),
            Effect::PanelVisibility { open: true }
        );
    }

    #[test]
    fn test_jump_within_unit_scrolls() {
        let ann = annotation("a", AnnotationType::Note, (42, 0), (43, 2), 1);
        let mut nav = reading(1, 1);
        nav.dispatch(Command::OpenAnnotationsPanel, &[]);

        let effect = nav.dispatch(Command::JumpToAnnotation { id: "a".into() }, &[ann]);
        assert_eq!(effect, Effect::ScrollTo { row_id: 42 });
        assert!(nav.panel_open());
    }

    #[test]
    fn test_jump_across_units_defers_scroll() {
        let mut ann = annotation("a", AnnotationType::Note, (900, 0), (900, 2), 1);
        ann.hizb = 30;
        ann.quarter = 3;
        let mut nav = reading(1, 1);
        nav.dispatch(Command::OpenAnnotationsPanel, &[]);

        let effect = nav.dispatch(Command::JumpToAnnotation { id: "a".into() }, &[ann]);
        assert_eq!(
            effect,
            Effect::LoadUnit {
                unit: UnitId { hizb: 30, quarter: 3 }
            }
        );
        assert!(!nav.panel_open());
        assert_eq!(nav.unit_loaded(), Some(900));
        assert_eq!(nav.unit_loaded(), None);
    }

    #[test]
    fn test_jump_to_unknown_annotation_is_ignored() {
        let mut nav = reading(1, 1);
        let effect = nav.dispatch(Command::JumpToAnnotation { id: "missing".into() }, &[]);
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn test_command_wire_format() {
        let cmd: Command =
            serde_json::from_str(r#"{"command": "openUnit", "hizb": 2, "quarter": 3, "focusRow": 17}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::OpenUnit {
                hizb: 2,
                quarter: 3,
                focus_row: Some(17)
            }
        );
        let back: Command = serde_json::from_str(r#"{"command": "back"}"#).unwrap();
        assert_eq!(back, Command::Back);
    }
}
