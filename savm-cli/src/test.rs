use super::*;
use std::fs;

fn unique_path(tag: &str) -> String {
    format!("cli_test_{}_{}.tmp", tag, std::process::id())
}

#[test]
fn asm_then_dis_round_trips_through_the_codec() {
    let source_path = unique_path("asm_src");
    let machine_path = unique_path("asm_out");
    let dis_path = unique_path("dis_out");

    fs::write(&source_path, "prii 7\nhlt\n").unwrap();

    run_asm(&source_path, &machine_path, true, false).unwrap();
    run_dis(&machine_path, &dis_path).unwrap();

    let rendered = fs::read_to_string(&dis_path).unwrap();
    assert_eq!(rendered, "prii 7\nhlt");

    fs::remove_file(&source_path).unwrap();
    fs::remove_file(&machine_path).unwrap();
    fs::remove_file(&dis_path).unwrap();
}

#[test]
fn exe_runs_an_assembled_machine_code_file() {
    let source_path = unique_path("exe_src");
    let machine_path = unique_path("exe_out");

    fs::write(&source_path, "prci 'k'\nhlt\n").unwrap();
    run_asm(&source_path, &machine_path, true, false).unwrap();
    run_exe(&machine_path).unwrap();

    fs::remove_file(&source_path).unwrap();
    fs::remove_file(&machine_path).unwrap();
}

#[test]
fn run_assembles_and_executes_directly() {
    let source_path = unique_path("run_src");
    fs::write(&source_path, "hlt\n").unwrap();
    run_run(&source_path).unwrap();
    fs::remove_file(&source_path).unwrap();
}

#[test]
fn malformed_source_surfaces_as_a_cli_error() {
    let source_path = unique_path("bad_src");
    fs::write(&source_path, "bra nowhere\n").unwrap();
    assert!(run_run(&source_path).is_err());
    fs::remove_file(&source_path).unwrap();
}

#[test]
fn cli_accepts_its_four_subcommands() {
    for sub in ["asm", "dis", "exe", "run"] {
        let result = build_cli().get_matches_from_safe(vec!["savm", sub, "input.txt"]);
        assert!(result.is_ok(), "subcommand '{}' failed to parse: {:?}", sub, result.err());
    }
}

#[test]
fn exe_subcommand_rejects_the_output_flag() {
    let result = build_cli().get_matches_from_safe(vec!["savm", "exe", "-o", "x", "input.txt"]);
    assert!(result.is_err());
}
