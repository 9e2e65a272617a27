//! Signature deciphering of `signatureCipher` formats.
//!
//! The player javascript holds a function `x=function(a){a=a.split("");...;return a.join("")}`
//! whose body calls three helpers of one object : reverse, splice and swap.
//! See also : https://tyrrrz.me/blog/reverse-engineering-youtube/

use crate::youtube_extractor::ErrorExtractor;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherFunction {
    Swap(usize),
    Slice(usize),
    Reverse,
}

static DECIPHER_FN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)\b[a-zA-Z0-9$]+\s*=\s*function\(\s*a\s*\)\s*\{\s*a\s*=\s*a\.split\(\s*""\s*\)\s*;(.*?)return\s+a\.join\(\s*""\s*\)"#,
    )
    .expect("valid decipher function regex")
});

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z0-9$]+)\.([a-zA-Z0-9$]+)\(\s*a\s*,\s*(\d+)\s*\)"#)
        .expect("valid helper call regex")
});

static HELPER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([a-zA-Z0-9$]+)\s*:\s*function\(\s*a\s*(?:,\s*b\s*)?\)\s*\{([^}]*)\}"#)
        .expect("valid helper regex")
});

/// Finds the operations applied to a signature by the player javascript
pub fn get_cipher_fun(js_code: &str) -> Result<Vec<CipherFunction>, ErrorExtractor> {
    let body = DECIPHER_FN_RE
        .captures(js_code)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ErrorExtractor::Cipher("Can't find decipher function".to_string()))?
        .as_str();

    let calls = CALL_RE
        .captures_iter(body)
        .filter_map(|c| {
            let object = c.get(1)?.as_str();
            let method = c.get(2)?.as_str();
            let arg = c.get(3)?.as_str().parse::<usize>().ok()?;
            Some((object, method, arg))
        })
        .collect::<Vec<_>>();

    let object = calls
        .first()
        .map(|(object, _, _)| *object)
        .ok_or_else(|| ErrorExtractor::Cipher("Empty decipher function".to_string()))?;

    let object_re = Regex::new(&format!(
        r#"(?s)var\s+{}\s*=\s*\{{(.*?)\}};"#,
        regex::escape(object)
    ))
    .map_err(|e| ErrorExtractor::Cipher(e.to_string()))?;
    let helpers = object_re
        .captures(js_code)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ErrorExtractor::Cipher(format!("Can't find helper object {object}")))?
        .as_str();

    let kinds = HELPER_RE
        .captures_iter(helpers)
        .filter_map(|c| {
            let name = c.get(1)?.as_str();
            let code = c.get(2)?.as_str();
            let kind = if code.contains("reverse") {
                CipherFunction::Reverse
            } else if code.contains("splice") {
                CipherFunction::Slice(0)
            } else {
                CipherFunction::Swap(0)
            };
            Some((name, kind))
        })
        .collect::<Vec<_>>();

    calls
        .iter()
        .map(|(_, method, arg)| {
            match kinds.iter().find(|(name, _)| name == method) {
                Some((_, CipherFunction::Reverse)) => Ok(CipherFunction::Reverse),
                Some((_, CipherFunction::Slice(_))) => Ok(CipherFunction::Slice(*arg)),
                Some((_, CipherFunction::Swap(_))) => Ok(CipherFunction::Swap(*arg)),
                None => Err(ErrorExtractor::Cipher(format!(
                    "Unknown helper {object}.{method}"
                ))),
            }
        })
        .collect()
}

pub fn decipher(signature: &str, cipher_fun: &[CipherFunction]) -> String {
    let mut sig = signature.chars().collect::<Vec<char>>();
    for f in cipher_fun {
        match *f {
            CipherFunction::Reverse => sig.reverse(),
            CipherFunction::Slice(i) => {
                sig.drain(..i.min(sig.len()));
            }
            CipherFunction::Swap(i) => swap(&mut sig, i),
        }
    }
    sig.into_iter().collect()
}

/// Swap a char with the first caracter (index taken modulo the length)
fn swap(sig: &mut [char], i: usize) {
    if !sig.is_empty() {
        let len = sig.len();
        sig.swap(0, i % len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_JS: &str = r#"var Xy={aB:function(a){a.reverse()},
cD:function(a,b){a.splice(0,b)},
eF:function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c}};
Uv=function(a){a=a.split("");Xy.eF(a,3);Xy.aB(a,45);Xy.cD(a,2);return a.join("")};"#;

    #[test]
    fn test_parse_cipher() {
        let fun = get_cipher_fun(PLAYER_JS).unwrap();
        assert_eq!(
            fun,
            vec![
                CipherFunction::Swap(3),
                CipherFunction::Reverse,
                CipherFunction::Slice(2)
            ]
        );
    }

    #[test]
    fn test_decipher() {
        let fun = [
            CipherFunction::Swap(3),
            CipherFunction::Reverse,
            CipherFunction::Slice(2),
        ];
        // abcdef -> dbcaef -> feacbd -> acbd
        assert_eq!(decipher("abcdef", &fun), "acbd");
    }

    #[test]
    fn test_swap_wraps_around() {
        assert_eq!(decipher("abc", &[CipherFunction::Swap(4)]), "bac");
    }

    #[test]
    fn test_no_decipher_function() {
        assert!(matches!(
            get_cipher_fun("var a = 1;"),
            Err(ErrorExtractor::Cipher(_))
        ));
    }
}
