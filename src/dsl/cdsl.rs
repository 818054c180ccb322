//! Grammar rules for component descriptors (`.cdsl`).
//!
//! Keywords are case-insensitive. Clauses inside the component block may
//! appear in any order but each at most once; `communications` and
//! `language` are mandatory.
//!
//! ```text
//! cdsl           = { import } component
//! component      = "component" ident "{" { clause } "}" ";"
//! clause         = communications | language | gui | options
//!                | innermodelviewer | statemachine
//! communications = "communications" "{" { comm_list } "}" ";"
//! comm_list      = ( "implements" | "requires" | "subscribesTo" | "publishes" )
//!                  comm { "," comm } ";"
//! comm           = ident [ "(" ident ")" ]
//! language       = "language" ( "cpp" | "cpp11" | "python" ) ";"
//! gui            = "gui" "Qt" "(" ( "QWidget" | "QMainWindow" | "QDialog" ) ")" ";"
//! options        = "options" ident { "," ident } ";"
//! innermodelviewer = "InnerModelViewer" ( "true" | "false" ) ";"
//! statemachine   = "statemachine" string [ "visual" ] ";"
//! ```

use super::lexer::TokenKind;
use super::parser::Parser;
use super::tree::{
    CdslTree, RawCommClause, RawCommEntry, RawComponent, RawGui, RawStateMachineRef,
};
use crate::error::Result;

/// Communication clause keywords, in canonical spelling.
pub const COMMUNICATION_KEYWORDS: [&str; 4] = ["implements", "requires", "subscribesTo", "publishes"];

const LANGUAGES: [&str; 3] = ["cpp", "cpp11", "python"];

const GUI_WIDGETS: [&str; 3] = ["QWidget", "QMainWindow", "QDialog"];

impl<'a> Parser<'a> {
    pub(super) fn parse_cdsl(&mut self) -> Result<CdslTree> {
        let imports = self.imports(true)?;
        let component = self.cdsl_component()?;
        Ok(CdslTree { imports, component })
    }

    fn cdsl_component(&mut self) -> Result<RawComponent> {
        let line = self.current.line;
        self.expect_keyword_ci("component")?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBrace)?;

        let mut communications: Option<Vec<RawCommClause>> = None;
        let mut language: Option<String> = None;
        let mut gui = None;
        let mut options: Option<Vec<String>> = None;
        let mut innermodelviewer = None;
        let mut statemachine = None;

        while !self.check(TokenKind::CloseBrace) {
            let clause_line = self.current.line;
            let keyword = self.expect_identifier()?.to_ascii_lowercase();
            let duplicated = match keyword.as_str() {
                "communications" => communications.replace(self.cdsl_communications()?).is_some(),
                "language" => language.replace(self.cdsl_language()?).is_some(),
                "gui" => gui.replace(self.cdsl_gui()?).is_some(),
                "options" => options.replace(self.cdsl_options()?).is_some(),
                "innermodelviewer" => innermodelviewer.replace(self.cdsl_bool()?).is_some(),
                "statemachine" => statemachine.replace(self.cdsl_statemachine()?).is_some(),
                other => {
                    return Err(self.error_at(
                        clause_line,
                        format!("unknown component clause '{}'", other),
                    ));
                }
            };
            if duplicated {
                return Err(self.error_at(
                    clause_line,
                    format!("clause '{}' given more than once", keyword),
                ));
            }
        }

        let communications = communications
            .ok_or_else(|| self.error("component is missing its 'communications' block"))?;
        let language = language.ok_or_else(|| self.error("component is missing its 'language' clause"))?;

        self.expect(TokenKind::CloseBrace)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(RawComponent {
            name,
            line,
            communications,
            language,
            gui,
            options: options.unwrap_or_default(),
            innermodelviewer,
            statemachine,
        })
    }

    fn cdsl_communications(&mut self) -> Result<Vec<RawCommClause>> {
        self.expect(TokenKind::OpenBrace)?;
        let mut clauses: Vec<RawCommClause> = Vec::new();
        while !self.check(TokenKind::CloseBrace) {
            let keyword = COMMUNICATION_KEYWORDS
                .iter()
                .find(|kw| self.at_keyword_ci(kw))
                .ok_or_else(|| {
                    self.error(format!(
                        "expected one of {}, found {}",
                        COMMUNICATION_KEYWORDS.join("/"),
                        self.describe_current()
                    ))
                })?;
            if clauses.iter().any(|c| c.keyword == *keyword) {
                return Err(self.error(format!("'{}' given more than once", keyword)));
            }
            self.advance()?;

            let mut entries = vec![self.cdsl_comm_entry()?];
            while self.eat(TokenKind::Comma)? {
                entries.push(self.cdsl_comm_entry()?);
            }
            self.expect(TokenKind::Semicolon)?;
            clauses.push(RawCommClause {
                keyword: keyword.to_string(),
                entries,
            });
        }
        self.expect(TokenKind::CloseBrace)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(clauses)
    }

    fn cdsl_comm_entry(&mut self) -> Result<RawCommEntry> {
        let line = self.current.line;
        let name = self.expect_identifier()?;
        let transport = if self.eat(TokenKind::OpenParen)? {
            let transport = self.expect_identifier()?;
            self.expect(TokenKind::CloseParen)?;
            Some(transport)
        } else {
            None
        };
        Ok(RawCommEntry {
            name,
            transport,
            line,
        })
    }

    fn cdsl_language(&mut self) -> Result<String> {
        let language = self.expect_identifier()?.to_ascii_lowercase();
        if !LANGUAGES.contains(&language.as_str()) {
            return Err(self.error(format!(
                "unsupported language '{}', expected one of {}",
                language,
                LANGUAGES.join(", ")
            )));
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(language)
    }

    fn cdsl_gui(&mut self) -> Result<RawGui> {
        self.expect_keyword_ci("qt")?;
        self.expect(TokenKind::OpenParen)?;
        let written = self.expect_identifier()?;
        let widget = GUI_WIDGETS
            .iter()
            .find(|w| w.eq_ignore_ascii_case(&written))
            .ok_or_else(|| {
                self.error(format!(
                    "unsupported gui widget '{}', expected one of {}",
                    written,
                    GUI_WIDGETS.join(", ")
                ))
            })?;
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(RawGui {
            library: "Qt".to_string(),
            widget: widget.to_string(),
        })
    }

    fn cdsl_options(&mut self) -> Result<Vec<String>> {
        let mut options = vec![self.expect_identifier()?];
        while self.eat(TokenKind::Comma)? {
            options.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(options)
    }

    fn cdsl_bool(&mut self) -> Result<bool> {
        let value = match self.expect_identifier()?.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => return Err(self.error(format!("expected true or false, found '{}'", other))),
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(value)
    }

    fn cdsl_statemachine(&mut self) -> Result<RawStateMachineRef> {
        let path = self.expect(TokenKind::Str)?.text;
        let visual = if self.at_keyword_ci("visual") {
            self.advance()?;
            true
        } else {
            false
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(RawStateMachineRef { path, visual })
    }
}

#[cfg(test)]
mod tests {
    use crate::dsl::tree::{CdslTree, ParseTree};
    use crate::dsl::{parse, Dialect};
    use crate::error::DslError;

    fn cdsl(input: &str) -> CdslTree {
        match parse(input, Dialect::Component).unwrap() {
            ParseTree::Component(tree) => tree,
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_parse_full_component() {
        let input = r#"
Import "Camera.idsl";
import "Laser.idsl";

Component camerafollower
{
    Communications
    {
        implements CameraSimple;
        requires Laser, DifferentialRobot(ros);
        subscribesTo JoystickAdapter(ICE);
        publishes CameraRGBDSimplePub;
    };
    language Cpp11;
    gui Qt(qwidget);
    options agmagent, InnerModelViewer;
    statemachine "statemachine.smdsl" visual;
};
"#;
        let tree = cdsl(input);
        assert_eq!(tree.imports.len(), 2);
        let comp = &tree.component;
        assert_eq!(comp.name, "camerafollower");
        assert_eq!(comp.language, "cpp11");
        assert_eq!(comp.communications.len(), 4);
        assert_eq!(comp.communications[1].keyword, "requires");
        assert_eq!(comp.communications[1].entries[1].transport.as_deref(), Some("ros"));
        assert_eq!(comp.communications[2].entries[0].transport.as_deref(), Some("ICE"));
        let gui = comp.gui.as_ref().unwrap();
        assert_eq!(gui.widget, "QWidget");
        assert_eq!(comp.options, vec!["agmagent", "InnerModelViewer"]);
        let sm = comp.statemachine.as_ref().unwrap();
        assert_eq!(sm.path, "statemachine.smdsl");
        assert!(sm.visual);
    }

    #[test]
    fn test_clauses_in_any_order() {
        let tree = cdsl("component c { language python; communications { requires A; }; };");
        assert_eq!(tree.component.language, "python");
        assert!(tree.component.gui.is_none());
        assert!(tree.component.options.is_empty());
    }

    #[test]
    fn test_innermodelviewer_clause() {
        let tree = cdsl("component c { communications { }; language cpp; InnerModelViewer True; };");
        assert_eq!(tree.component.innermodelviewer, Some(true));

        let tree = cdsl("component c { communications { }; language cpp; innermodelviewer false; };");
        assert_eq!(tree.component.innermodelviewer, Some(false));

        let err = parse(
            "component c { communications { }; language cpp; innermodelviewer maybe; };",
            Dialect::Component,
        )
        .unwrap_err();
        assert!(err.to_string().contains("true or false"));
    }

    #[test]
    fn test_missing_language() {
        let err = parse("component c { communications { }; };", Dialect::Component).unwrap_err();
        assert!(matches!(err, DslError::Parse { .. }));
    }

    #[test]
    fn test_unknown_language() {
        let err = parse(
            "component c { communications { }; language rust; };",
            Dialect::Component,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported language"));
    }

    #[test]
    fn test_duplicate_clause() {
        let err = parse(
            "component c { communications { }; language cpp; language cpp; };",
            Dialect::Component,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
