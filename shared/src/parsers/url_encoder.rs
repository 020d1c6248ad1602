/// Se encarga de codificar en formato urlencoding.
/// Recibe bytes (por ejemplo un info_hash) y los devuelve codificados segun sus caracteres ascii.
/// Los caracteres no reservados quedan igual; el resto pasa a formato %xx.
///
/// Ejemplo
/// ```
/// # use shared::parsers::url_encoder;
/// let result = url_encoder::from_string_bytes(b" A<>d".to_vec());
/// assert_eq!(result, "%20A%3c%3ed".as_bytes().to_vec());
/// ```
pub fn from_string_bytes(to_encode: Vec<u8>) -> Vec<u8> {
    to_encode
        .into_iter()
        .map(|ch| match ch {
            //Son los chars que no se deben codificar con formato %xx
            b'-' | b'.' | b'0'..=b'9' | b'A'..=b'Z' | b'_' | b'a'..=b'z' | b'~' => {
                (ch as char).to_string()
            }
            _ => format!("%{:02x}", ch),
        })
        .collect::<String>()
        .into_bytes()
}
