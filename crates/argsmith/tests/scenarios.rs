use argsmith::validate::IntegerValidator;
use argsmith::{
    ArgumentDef, Command, Error, ErrorCode, GnuStyle, Grouping, OptionDef, Parser, Scalar, Value,
    WindowsStyle,
};

fn build(command: argsmith::CommandBuilder) -> Command {
    command.build().expect("grammar should build")
}

#[test]
fn required_argument_and_verbose_flag() {
    let parser = Parser::new(build(
        Command::builder("make")
            .argument(ArgumentDef::new("file"))
            .option(OptionDef::new("v").alias("verbose")),
    ))
    .unwrap();

    let result = parser.parse(["build.txt", "-v"]).unwrap();
    assert_eq!(result.argument::<String>(0), Ok(Some("build.txt".to_string())));
    assert_eq!(result.option::<bool>("verbose"), Ok(Some(true)));
    let options: Vec<(&str, &Value)> = result.options().collect();
    assert_eq!(options, vec![("v", &Value::Flag(true))]);
}

#[test]
fn integer_range_violation_names_the_validator() {
    let parser = Parser::new(build(
        Command::builder("run").option(
            OptionDef::new("count")
                .used_as_single_parameter()
                .validate_with(IntegerValidator::range(0, 10))
                .type_as::<i64>(),
        ),
    ))
    .unwrap();

    let err = parser.parse(["--count=15"]).unwrap_err();
    match &err {
        Error::Validation(details) => {
            assert_eq!(details.validator(), "IntegerValidator");
            assert_eq!(details.value(), "15");
        }
        other => panic!("expected Validation, got: {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::ValidationFailure);

    let result = parser.parse(["--count=7"]).unwrap();
    assert_eq!(result.option::<i64>("count"), Ok(Some(7)));
}

#[test]
fn repeatable_option_defaults_to_empty_list() {
    let parser = Parser::new(build(
        Command::builder("grep").option(
            OptionDef::new("r")
                .alias("repeat")
                .used_as_unlimited_occurrences_single_parameter()
                .defaults_to(Value::empty_list()),
        ),
    ))
    .unwrap();

    let result = parser.parse(Vec::<String>::new()).unwrap();
    assert!(result.is_assigned("repeat"));
    assert_eq!(result.option::<Vec<String>>("repeat"), Ok(Some(Vec::new())));

    let result = parser.parse(["-r", "a", "--repeat", "b", "-r=c"]).unwrap();
    assert_eq!(
        result.option::<Vec<String>>("r"),
        Ok(Some(vec!["a".into(), "b".into(), "c".into()]))
    );
    assert_eq!(result.occurrences("repeat"), 3);
}

#[test]
fn windows_options_must_precede_arguments() {
    let parser = Parser::with_style(
        build(
            Command::builder("copy")
                .argument(ArgumentDef::new("file"))
                .option(OptionDef::new("v")),
        ),
        WindowsStyle,
    )
    .unwrap()
    .grouping(Grouping::OptionsBeforeArguments);

    let err = parser.parse(["file.txt", "/v"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::OptionsBeforeParameters);

    let result = parser.parse(["/v", "file.txt"]).unwrap();
    assert!(result.flag("v"));
}

#[test]
fn combined_short_flags() {
    let parser = Parser::new(build(
        Command::builder("tool")
            .option(OptionDef::new("a"))
            .option(OptionDef::new("b")),
    ))
    .unwrap();

    let result = parser.parse(["-ab"]).unwrap();
    assert_eq!(result.occurrences("a"), 1);
    assert_eq!(result.occurrences("b"), 1);

    let err = parser.parse(["-ab=x"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidOptionParametersSpecified);
}

#[test]
fn gnu_getopt_style_values() {
    let parser = Parser::with_style(
        build(
            Command::builder("cc")
                .argument(ArgumentDef::new("sources").unlimited())
                .option(OptionDef::new("o").used_as_single_parameter())
                .option(OptionDef::new("O").used_as_single_parameter().type_as::<i64>())
                .option(OptionDef::new("c")),
        ),
        GnuStyle,
    )
    .unwrap();

    let result = parser.parse(["-cO2", "-oapp", "main.c", "util.c"]).unwrap();
    assert!(result.flag("c"));
    assert_eq!(result.option::<i64>("O"), Ok(Some(2)));
    assert_eq!(result.option::<String>("o"), Ok(Some("app".into())));
    assert_eq!(
        result.argument::<Vec<String>>(0),
        Ok(Some(vec!["main.c".into(), "util.c".into()]))
    );
}

#[test]
fn negative_numbers_are_arguments() {
    let parser = Parser::new(build(
        Command::builder("calc")
            .argument(ArgumentDef::new("a").type_as::<i64>())
            .argument(ArgumentDef::new("b").type_as::<f64>())
            .option(OptionDef::new("x")),
    ))
    .unwrap();

    let result = parser.parse(["-3", "-0.5", "-x"]).unwrap();
    assert_eq!(result.argument::<i64>(0), Ok(Some(-3)));
    assert_eq!(result.argument::<f64>(1), Ok(Some(-0.5)));
    assert!(result.flag("x"));
}

#[test]
fn formatter_runs_before_converter_and_raw_is_kept() {
    let parser = Parser::new(build(
        Command::builder("color").argument(
            ArgumentDef::new("hex")
                .format_as(|s| s.trim_start_matches('#').to_ascii_lowercase())
                .convert_with(|s| {
                    i64::from_str_radix(s, 16)
                        .map(Scalar::Integer)
                        .map_err(|e| format!("'{s}' is not hex: {e}"))
                }),
        ),
    ))
    .unwrap();

    let result = parser.parse(["#FF"]).unwrap();
    assert_eq!(result.argument::<i64>(0), Ok(Some(255)));
    assert_eq!(result.raw_argument(0), Some(&["#FF".to_string()][..]));
}

#[test]
fn case_insensitive_names() {
    let parser = Parser::with_style(
        build(
            Command::builder("tool")
                .option(OptionDef::new(argsmith::Name::ignore_case("Verbose")))
                .subcommand(Command::builder(argsmith::Name::ignore_case("Build"))),
        ),
        WindowsStyle,
    )
    .unwrap();

    let result = parser.parse(["BUILD"]).unwrap();
    assert_eq!(result.command_path(), &["tool", "Build"]);
    assert!(parser.parse(["/VERBOSE"]).unwrap().flag("verbose"));
}

#[test]
fn report_serializes_to_json() {
    let parser = Parser::new(build(
        Command::builder("tool")
            .argument(ArgumentDef::new("n").type_as::<i64>())
            .option(OptionDef::new("tag").used_as_unlimited_occurrences_single_parameter())
            .option(OptionDef::new("quiet")),
    ))
    .unwrap();

    let report = parser.parse(["5", "--tag", "a", "--tag", "b"]).unwrap().to_report();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "command": ["tool"],
            "groups": [0],
            "arguments": { "n": 5 },
            "options": { "tag": { "occurrences": 2, "value": ["a", "b"] } }
        })
    );
}
