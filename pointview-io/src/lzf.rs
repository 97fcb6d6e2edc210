//! LZF decompression for `DATA binary_compressed` PCD bodies

use crate::error::DecodeError;

/// Decompress an LZF block whose decompressed length is known up front
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>, DecodeError> {
    // `expected_len` comes from the file header; grow past this if needed
    let mut output = Vec::with_capacity(expected_len.min(input.len().saturating_mul(2)));
    let mut ip = 0;

    while ip < input.len() {
        let ctrl = input[ip] as usize;
        ip += 1;

        if ctrl < 32 {
            // Literal run of ctrl + 1 bytes
            let len = ctrl + 1;
            let literal = input
                .get(ip..ip + len)
                .ok_or(DecodeError::Lzf("literal run past end of input"))?;
            output.extend_from_slice(literal);
            ip += len;
        } else {
            // Back reference
            let mut len = ctrl >> 5;
            if len == 7 {
                len += *input
                    .get(ip)
                    .ok_or(DecodeError::Lzf("missing extended length byte"))? as usize;
                ip += 1;
            }
            let low = *input
                .get(ip)
                .ok_or(DecodeError::Lzf("missing back reference offset"))? as usize;
            ip += 1;

            let distance = ((ctrl & 0x1f) << 8) + low + 1;
            if distance > output.len() {
                return Err(DecodeError::Lzf("back reference before start of output"));
            }

            // Source and destination may overlap, so copy byte by byte.
            let start = output.len() - distance;
            for i in 0..len + 2 {
                let byte = output[start + i];
                output.push(byte);
            }
        }

        if output.len() > expected_len {
            return Err(DecodeError::Lzf("output exceeds declared size"));
        }
    }

    if output.len() != expected_len {
        return Err(DecodeError::Lzf("output shorter than declared size"));
    }
    Ok(output)
}
