use super::*;

#[test]
fn test_numbered_line() {
    let t = Tokeniser::default();
    assert_eq!(
        t.tokenise_line("10 PRINT \"HI\""),
        vec![0, 0xC0, 0xDE, 10, 0, PRINT, b' ', b'"', b'H', b'I', b'"']
    );
}

#[test]
fn test_direct_line() {
    let t = Tokeniser::default();
    assert_eq!(
        t.tokenise_line("print 1+2"),
        vec![b':', PRINT, b' ', C_0 + 1, O_PLUS, C_0 + 2]
    );
    assert_eq!(t.tokenise_line("?a=b"), vec![b':', PRINT, b'A', O_EQ, b'B']);
    assert_eq!(t.tokenise_line("   "), Vec::<u8>::new());
}

#[test]
fn test_jump_numbers() {
    let t = Tokeniser::default();
    assert_eq!(t.tokenise_line("GOTO 100"), vec![b':', GOTO, b' ', T_UINT, 100, 0]);
    assert_eq!(
        t.tokenise_line("LIST 10-20"),
        vec![b':', LIST, b' ', T_UINT, 10, 0, O_MINUS, T_UINT, 20, 0]
    );
    assert_eq!(
        t.tokenise_line("on x gosub 10,20"),
        vec![
            b':', ON, b' ', b'X', b' ', GOSUB, b' ', T_UINT, 10, 0, b',', T_UINT, 20, 0
        ]
    );
}

#[test]
fn test_go_to() {
    let t = Tokeniser::default();
    assert_eq!(t.tokenise_line("GO  TO 5"), vec![b':', GOTO, b' ', T_UINT, 5, 0]);
    assert_eq!(t.tokenise_line("GO SUB 5"), vec![b':', GOSUB, b' ', T_UINT, 5, 0]);
    assert_eq!(t.tokenise_line("GOTOX"), b":GOTOX".to_vec());
}

#[test]
fn test_keyword_inside_name() {
    let t = Tokeniser::default();
    assert_eq!(t.tokenise_line("TOP=1"), vec![b':', b'T', b'O', b'P', O_EQ, C_0 + 1]);
}

#[test]
fn test_big_line_number() {
    let t = Tokeniser::default();
    let code = t.tokenise_line("65535 PRINT");
    assert_eq!(&code[..6], &[0, 0xC0, 0xDE, 0x99, 0x19, C_0 + 5]);
}

#[test]
fn test_comment_forms() {
    let t = Tokeniser::default();
    assert_eq!(
        t.tokenise_line("10 ' hi"),
        vec![0, 0xC0, 0xDE, 10, 0, b':', REM, O_REM, b' ', b'h', b'i']
    );
    assert_eq!(listing(&t, "10 ' hi"), "10 ' hi");
    assert_eq!(listing(&t, "10 REM a:b"), "10 REM a:b");
}

#[test]
fn test_data_is_verbatim() {
    let t = Tokeniser::default();
    let code = t.tokenise_line("DATA 1,\"A:B\",c:PRINT");
    let mut expected = vec![b':', DATA];
    expected.extend_from_slice(b" 1,\"A:B\",c:");
    expected.push(PRINT);
    assert_eq!(code, expected);
}

#[test]
fn test_while_and_else() {
    let t = Tokeniser::default();
    assert_eq!(
        t.tokenise_line("WHILE 1"),
        vec![b':', WHILE, O_PLUS, b' ', C_0 + 1]
    );
    assert_eq!(listing(&t, "10 WHILE A<3"), "10 WHILE A<3");
    assert_eq!(
        listing(&t, "10 IF A THEN 10 ELSE 20"),
        "10 IF A THEN 10 ELSE 20"
    );
}

#[test]
fn test_listing_round_trip() {
    let t = Tokeniser::default();
    for line in &[
        "10 PRINT X",
        "20 FOR I=1 TO 10 STEP 2",
        "30 PRINT(1)",
        "40 A$=LEFT$(B$,2)",
        "50 GOSUB 1000",
        "60 X=1.5+&HFF",
    ] {
        assert_eq!(&listing(&t, line), line);
    }
}

#[test]
fn test_line_zero_keeps_space() {
    let t = Tokeniser::default();
    assert_eq!(
        t.tokenise_line("0 PRINT"),
        vec![0, 0xC0, 0xDE, 0, 0, b' ', PRINT]
    );
    assert_eq!(listing(&t, "0 PRINT"), "0 PRINT");
}

#[test]
fn test_debug_keyword() {
    assert_eq!(Tokeniser::default().keyword(DEBUG), None);
    let t = Tokeniser::new(true);
    assert_eq!(t.tokenise_line("DEBUG x:y"), b":\xff\xff x:y".to_vec());
}
