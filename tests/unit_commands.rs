use musicbox::domain::commands::SlashCommand;

#[test]
fn parse_play_without_args_resumes() {
    let cmd = SlashCommand::parse("/play").expect("parse /play");
    assert_eq!(cmd, SlashCommand::Play(None));
}

#[test]
fn parse_play_index_is_one_based() {
    let cmd = SlashCommand::parse("/play 3").expect("parse /play 3");
    assert_eq!(cmd, SlashCommand::Play(Some(2)));
}

#[test]
fn parse_add_keeps_spaces_in_path() {
    let cmd = SlashCommand::parse("/add ~/Music/Side A/01 Intro.mp3").expect("parse /add");
    assert_eq!(
        cmd,
        SlashCommand::Add("~/Music/Side A/01 Intro.mp3".to_string())
    );
}

#[test]
fn parse_transport_aliases() {
    assert_eq!(SlashCommand::parse("/n").expect("parse /n"), SlashCommand::Next);
    assert_eq!(
        SlashCommand::parse("/prev").expect("parse /prev"),
        SlashCommand::Previous
    );
    assert_eq!(
        SlashCommand::parse("  /pause  ").expect("parse /pause"),
        SlashCommand::Pause
    );
    assert_eq!(SlashCommand::parse("/q").expect("parse /q"), SlashCommand::Quit);
}

#[test]
fn parse_volume_keeps_out_of_range_values_for_clamping() {
    assert_eq!(
        SlashCommand::parse("/volume 150").expect("parse /volume"),
        SlashCommand::Volume(150)
    );
    assert_eq!(
        SlashCommand::parse("/vol -3").expect("parse /vol"),
        SlashCommand::Volume(-3)
    );
}

#[test]
fn parse_remove_and_download() {
    assert_eq!(
        SlashCommand::parse("/rm 2").expect("parse /rm"),
        SlashCommand::Remove(1)
    );
    assert_eq!(
        SlashCommand::parse("/download https://example.com/v").expect("parse /download"),
        SlashCommand::Download("https://example.com/v".to_string())
    );
}

#[test]
fn reject_missing_arguments() {
    for input in ["/add", "/remove", "/download", "/volume"] {
        let err = SlashCommand::parse(input).expect_err("missing argument should fail");
        assert!(err.to_string().starts_with("usage:"), "{input}: {err}");
    }
}

#[test]
fn reject_unknown_command() {
    let err = SlashCommand::parse("/does-not-exist").expect_err("unknown command should fail");
    assert!(err.to_string().contains("unknown command"));
}

#[test]
fn reject_zero_play_index() {
    let err = SlashCommand::parse("/play 0").expect_err("index 0 should fail");
    assert!(err.to_string().contains(">= 1"));
}

#[test]
fn reject_input_without_slash() {
    let err = SlashCommand::parse("play").expect_err("missing slash should fail");
    assert!(err.to_string().contains("must start with '/'"));
}
