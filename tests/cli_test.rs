use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::{PathBuf,Path};
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const SAMPLE: &str = "I am Sam. Sam I am. I do not like this Sam I am.\n\
Do you like green eggs and ham?\n\
I do not like them, Sam-I-am.\n\
I do not like green eggs and ham.\n";

// Write `dat` into the temporary directory under `name`.
fn make_input(temp_dir: &tempfile::TempDir,name: &str,dat: &[u8]) -> Result<PathBuf,Box<dyn std::error::Error>> {
    let path = temp_dir.path().join(name);
    match std::fs::write(&path,dat) {
        Ok(_) => Ok(path),
        Err(e) => Err(Box::new(e))
    }
}

fn run(subcommand: &str,in_path: &Path,out_path: &Path) -> Result<assert_cmd::assert::Assert,Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("huffcompress")?;
    Ok(cmd.arg(subcommand)
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert())
}

fn round_trip_test(dat: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = make_input(&temp_dir,"original.bin",dat)?;
    let cmp_path = temp_dir.path().join("compressed.huf");
    let out_path = temp_dir.path().join("expanded.bin");
    run("compress",&in_path,&cmp_path)?
        .success()
        .stderr(predicate::str::contains(format!("compressed {} into",dat.len())));
    run("expand",&cmp_path,&out_path)?
        .success()
        .stderr(predicate::str::contains(format!("into {}",dat.len())));
    match (std::fs::read(in_path),std::fs::read(out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn text_round_trip() -> STDRESULT {
    round_trip_test(SAMPLE.as_bytes())
}

#[test]
fn binary_round_trip() -> STDRESULT {
    let dat: Vec<u8> = (0..20000u32).map(|i| ((i * 7919) % 256) as u8 ^ (i % 13) as u8).collect();
    round_trip_test(&dat)
}

#[test]
fn empty_round_trip() -> STDRESULT {
    round_trip_test(&[])
}

#[test]
fn single_symbol_round_trip() -> STDRESULT {
    round_trip_test(&[0x41;1000])
}

#[test]
fn compression_output() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = make_input(&temp_dir,"abcd.txt","aaaabbbccd".as_bytes())?;
    let out_path = temp_dir.path().join("abcd.huf");
    run("compress",&in_path,&out_path)?
        .success()
        .stderr(predicate::str::contains("compressed 10 into 1031"));
    let compressed = std::fs::read(&out_path)?;
    assert_eq!(compressed.len(),1031);
    assert_eq!(compressed[4*0x61..4*0x65],hex::decode("00000004000000030000000200000001")?);
    assert_eq!(compressed[1024..],hex::decode("000000130abfc0")?);
    Ok(())
}

#[test]
fn compression_is_smaller() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let dat = SAMPLE.repeat(200);
    let in_path = make_input(&temp_dir,"sample.txt",dat.as_bytes())?;
    let out_path = temp_dir.path().join("sample.huf");
    run("compress",&in_path,&out_path)?.success();
    let out_len = std::fs::metadata(&out_path)?.len();
    assert!(out_len < dat.len() as u64 * 3 / 4);
    Ok(())
}

#[test]
fn truncated_container_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = make_input(&temp_dir,"sample.txt",SAMPLE.as_bytes())?;
    let cmp_path = temp_dir.path().join("sample.huf");
    let out_path = temp_dir.path().join("sample.out");
    run("compress",&in_path,&cmp_path)?.success();
    let compressed = std::fs::read(&cmp_path)?;
    let bad_path = make_input(&temp_dir,"bad.huf",&compressed[0..compressed.len()-2])?;
    run("expand",&bad_path,&out_path)?
        .failure()
        .stderr(predicate::str::contains("Truncated"));
    assert!(!out_path.exists());
    Ok(())
}

#[test]
fn missing_input_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("does_not_exist");
    let out_path = temp_dir.path().join("out.huf");
    run("compress",&in_path,&out_path)?.failure();
    assert!(!out_path.exists());
    Ok(())
}
