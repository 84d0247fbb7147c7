use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_until, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map_res, opt, value},
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::export::Format;

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Import { path: String },
    Calculate { output: Option<String>, format: Option<Format> },
    Show { index: usize },
    Map {
        sites: String,
        paths: String,
        site_color: Option<String>,
        path_color: Option<String>,
        output: Option<String>,
    },
    Status,
    Help,
    Exit,
}

// --- BASIC PARSERS ---

fn parse_usize(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = take_until("\"")(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content.to_string()))
}

fn parse_format(input: &str) -> IResult<&str, Format> {
    alt((
        value(Format::Json, tag_ci("JSON")),
        value(Format::Csv, tag_ci("CSV")),
    ))(input)
}

fn parse_color_token(input: &str) -> IResult<&str, String> {
    let (input, token) = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '#')(input)?;
    Ok((input, token.to_string()))
}

// --- HELPERS ---
fn ws<'a, F, O, E: nom::error::ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where F: FnMut(&'a str) -> IResult<&'a str, O, E> {
    delimited(multispace0, inner, multispace0)
}

fn tag_ci(t: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| tag_no_case(t)(input)
}

fn into_path(input: &str) -> IResult<&str, Option<String>> {
    opt(preceded(ws(tag_ci("INTO")), parse_quoted_string))(input)
}

// --- COMMAND PARSERS ---

fn parse_import(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("IMPORT"), tag_ci("LOAD")))(input)?;
    let (input, _) = multispace1(input)?;
    let (input, path) = parse_quoted_string(input)?;
    Ok((input, Command::Import { path }))
}

fn parse_calculate(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("CALCULATE"), tag_ci("CALC")))(input)?;
    let (input, output) = into_path(input)?;
    let (input, format) = opt(preceded(ws(tag_ci("AS")), parse_format))(input)?;
    Ok((input, Command::Calculate { output, format }))
}

fn parse_show(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("SHOW")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, index) = parse_usize(input)?;
    Ok((input, Command::Show { index }))
}

fn parse_map(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("MAP")(input)?;
    let (input, _) = ws(tag_ci("SITES"))(input)?;
    let (input, sites) = parse_quoted_string(input)?;
    let (input, _) = ws(tag_ci("PATHS"))(input)?;
    let (input, paths) = parse_quoted_string(input)?;

    let (input, site_color) = opt(preceded(
        tuple((ws(tag_ci("SITE")), ws(tag_ci("COLOR")))),
        parse_color_token,
    ))(input)?;
    let (input, path_color) = opt(preceded(
        tuple((ws(tag_ci("PATH")), ws(tag_ci("COLOR")))),
        parse_color_token,
    ))(input)?;
    let (input, output) = into_path(input)?;

    Ok((input, Command::Map { sites, paths, site_color, path_color, output }))
}

fn parse_status(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("STATUS")(input)?;
    Ok((input, Command::Status))
}

fn parse_help(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("HELP")(input)?;
    Ok((input, Command::Help))
}

fn parse_exit(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("EXIT"), tag_ci("QUIT")))(input)?;
    Ok((input, Command::Exit))
}

pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let result = alt((
        parse_import,
        parse_calculate,
        parse_show,
        parse_map,
        parse_status,
        parse_help,
        parse_exit,
    ))(input);

    match result {
        Ok((remainder, cmd)) => {
            if !remainder.trim().is_empty() {
                return Err(format!("Unexpected tokens at end: '{}'", remainder));
            }
            Ok(cmd)
        },
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let context = match e.input.char_indices().nth(20) {
                Some((cut, _)) => format!("{}...", &e.input[..cut]),
                None => e.input.to_string(),
            };
            Err(format!("Invalid syntax near: '{}'", context))
        },
        Err(nom::Err::Incomplete(_)) => Err("Incomplete command.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_takes_quoted_path() {
        assert_eq!(
            parse_command("import \"data/points 1.csv\"").unwrap(),
            Command::Import { path: "data/points 1.csv".into() }
        );
    }

    #[test]
    fn calculate_options() {
        assert_eq!(
            parse_command("CALCULATE").unwrap(),
            Command::Calculate { output: None, format: None }
        );
        assert_eq!(
            parse_command("calc into \"out.json\" as json").unwrap(),
            Command::Calculate { output: Some("out.json".into()), format: Some(Format::Json) }
        );
    }

    #[test]
    fn map_with_colors() {
        let cmd = parse_command("MAP SITES \"s.csv\" PATHS \"p.csv\" SITE COLOR #ff0000 PATH COLOR blue INTO \"m.png\"").unwrap();
        assert_eq!(
            cmd,
            Command::Map {
                sites: "s.csv".into(),
                paths: "p.csv".into(),
                site_color: Some("#ff0000".into()),
                path_color: Some("blue".into()),
                output: Some("m.png".into()),
            }
        );
    }

    #[test]
    fn show_and_simple_commands() {
        assert_eq!(parse_command("show 12").unwrap(), Command::Show { index: 12 });
        assert_eq!(parse_command("STATUS").unwrap(), Command::Status);
        assert_eq!(parse_command("quit").unwrap(), Command::Exit);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_command("HELP me").unwrap_err();
        assert!(err.contains("Unexpected tokens"), "{}", err);
    }

    #[test]
    fn unknown_command_reports_context() {
        let err = parse_command("DROP TABLE points").unwrap_err();
        assert!(err.starts_with("Invalid syntax near"), "{}", err);
    }
}
