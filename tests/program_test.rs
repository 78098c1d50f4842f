mod common;
use basic::mach::Runtime;
use common::*;

fn numbered() -> Runtime {
    let mut r = Runtime::default();
    program(&mut r, &["10 PRINT 1", "20 PRINT 2", "30 PRINT 3"]);
    r
}

#[test]
fn test_list_ranges() {
    let mut r = numbered();
    r.enter("LIST");
    assert_eq!(exec(&mut r), "10 PRINT 1\n20 PRINT 2\n30 PRINT 3\n");
    r.enter("LIST 20");
    assert_eq!(exec(&mut r), "20 PRINT 2\n");
    r.enter("LIST 20-");
    assert_eq!(exec(&mut r), "20 PRINT 2\n30 PRINT 3\n");
    r.enter("LIST -20");
    assert_eq!(exec(&mut r), "10 PRINT 1\n20 PRINT 2\n");
}

#[test]
fn test_replace_and_remove_lines() {
    let mut r = numbered();
    r.enter("20 PRINT 22");
    r.enter("10");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "20 PRINT 22\n30 PRINT 3\n");
    r.enter("15");
    assert_eq!(exec(&mut r), "UNDEFINED LINE NUMBER\n");
}

#[test]
fn test_delete() {
    let mut r = numbered();
    r.enter("DELETE 20");
    assert_eq!(exec(&mut r), "");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "10 PRINT 1\n30 PRINT 3\n");
    r.enter("DELETE");
    assert_eq!(exec(&mut r), "ILLEGAL FUNCTION CALL\n");
    r.enter("DELETE -30");
    assert_eq!(exec(&mut r), "");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "");
}

#[test]
fn test_renum() {
    let mut r = Runtime::default();
    program(&mut r, &["1 GOTO 3", "3 END"]);
    r.enter("RENUM");
    assert_eq!(exec(&mut r), "");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "10 GOTO 20\n20 END\n");
    r.enter("RENUM 100,,5");
    assert_eq!(exec(&mut r), "");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "100 GOTO 105\n105 END\n");
}

#[test]
fn test_renum_reports_undefined_jumps() {
    let mut r = Runtime::default();
    program(&mut r, &["5 GOTO 99"]);
    r.enter("RENUM");
    assert_eq!(exec(&mut r), "Undefined line 99 in 10\n");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "10 GOTO 99\n");
}

#[test]
fn test_edit() {
    let mut r = numbered();
    r.enter("EDIT 20");
    assert_eq!(exec(&mut r), "20 PRINT 2\n");
    r.enter("EDIT 50");
    assert_eq!(exec(&mut r), "UNDEFINED LINE NUMBER\n");
}

#[test]
fn test_editing_clears_variables() {
    let mut r = numbered();
    r.enter("A=5");
    assert_eq!(exec(&mut r), "");
    r.enter("40 REM");
    r.enter("PRINT A");
    assert_eq!(exec(&mut r), " 0 \n");
}

#[test]
fn test_peek_and_poke() {
    let mut r = numbered();
    r.enter("PRINT PEEK(4718);PEEK(1)");
    assert_eq!(exec(&mut r), " 0 -1 \n");
    r.enter("POKE 4721,99:LIST 10");
    assert_eq!(exec(&mut r), "10 PRINT 1\n");
    r.enter("POKE 1,300");
    assert_eq!(exec(&mut r), "ILLEGAL FUNCTION CALL\n");
}

#[test]
fn test_run_from_line() {
    let mut r = numbered();
    r.enter("RUN 20");
    assert_eq!(exec(&mut r), " 2 \n 3 \n");
    r.enter("RUN 25");
    assert_eq!(exec(&mut r), "UNDEFINED LINE NUMBER\n");
}
